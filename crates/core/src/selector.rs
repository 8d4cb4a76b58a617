//! Scenario Selector
//!
//! Presents the catalog as a numbered menu and keeps prompting until the user
//! enters a valid 1-based index. Input arrives as [`ConsoleLines`] and the
//! writer is injected, so the menu can be driven from a script in tests.

use crate::{
    console::ConsoleLines,
    scenario::{Scenario, ScenarioCatalog},
};
use std::io::{self, Write};
use std::num::IntErrorKind;
use tracing::debug;

/// Input that abandons the selection instead of choosing a scenario.
const CANCEL_INPUT: &str = "quit";

/// Shows the scenario menu and returns the chosen scenario.
///
/// Invalid input is reported and the prompt repeated, with no limit on the
/// number of attempts. Returns `Ok(None)` if the user types `quit` or the
/// input reaches end-of-file.
pub async fn choose_scenario<'a, W>(
    catalog: &'a ScenarioCatalog,
    input: &mut ConsoleLines,
    mut output: W,
) -> io::Result<Option<&'a Scenario>>
where
    W: Write,
{
    writeln!(output, "Welcome to the Audit Practice Simulator.")?;
    writeln!(output, "Please choose a scenario to practice:")?;
    for (i, scenario) in catalog.scenarios().iter().enumerate() {
        writeln!(output, "{}: {}", i + 1, scenario.name)?;
    }

    loop {
        write!(output, "Enter the number of your choice: ")?;
        output.flush()?;

        let Some(line) = input.recv().await else {
            debug!("Input closed during scenario selection");
            return Ok(None);
        };
        let entry = line.trim();
        if entry.eq_ignore_ascii_case(CANCEL_INPUT) {
            return Ok(None);
        }

        let picked = match entry.parse::<i64>() {
            Ok(choice) => usize::try_from(choice)
                .ok()
                .and_then(|n| n.checked_sub(1))
                .and_then(|index| catalog.get(index)),
            // Too many digits is still a number, just not one on the list.
            Err(e)
                if matches!(
                    e.kind(),
                    IntErrorKind::PosOverflow | IntErrorKind::NegOverflow
                ) =>
            {
                None
            }
            Err(_) => {
                writeln!(output, "Invalid input. Please enter a number.")?;
                continue;
            }
        };
        match picked {
            Some(scenario) => {
                debug!(scenario = %scenario.id, "Scenario selected");
                return Ok(Some(scenario));
            }
            None => writeln!(
                output,
                "Invalid choice. Please select a number from the list."
            )?,
        }
    }
}
