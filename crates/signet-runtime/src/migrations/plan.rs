use signet_core::error::{Result, SignetError};

use super::MigrationStep;

/// A step to apply, with the version recorded once it succeeds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct PlannedStep<'a> {
    pub version: i64,
    pub description: &'a str,
    pub script: &'a str,
}

/// Steps that take the schema from `current` to `target`.
///
/// Targets outside `[0, steps.len()]` are rejected before anything runs.
pub(crate) fn plan_steps(
    steps: &[MigrationStep],
    current: i64,
    target: i64,
) -> Result<Vec<PlannedStep<'_>>> {
    let available = steps.len() as i64;

    if current < 0 || current > available {
        return Err(SignetError::Migration(format!(
            "current version [{}] is outside the available steps [0, {}]",
            current, available
        )));
    }

    if target >= current {
        plan_up(steps, current, target)
    } else {
        plan_down(steps, current, target)
    }
}

fn plan_up(steps: &[MigrationStep], current: i64, target: i64) -> Result<Vec<PlannedStep<'_>>> {
    let available = steps.len() as i64;
    if target > available {
        return Err(SignetError::Migration(format!(
            "target version is higher [{}] than the available number of steps [{}]",
            target, available
        )));
    }

    Ok((current..target)
        .map(|c| {
            let step = &steps[c as usize];
            PlannedStep {
                version: c + 1,
                description: &step.version_description,
                script: &step.up,
            }
        })
        .collect())
}

fn plan_down(steps: &[MigrationStep], current: i64, target: i64) -> Result<Vec<PlannedStep<'_>>> {
    let available = steps.len() as i64;
    if target < 0 {
        return Err(SignetError::Migration(format!(
            "target version is lower [{}] than zero",
            target
        )));
    }
    if target > available {
        return Err(SignetError::Migration(format!(
            "target version is higher [{}] than the available number of steps [{}]",
            target, available
        )));
    }

    Ok(((target + 1)..=current)
        .rev()
        .map(|c| {
            let step = &steps[(c - 1) as usize];
            PlannedStep {
                version: c - 1,
                description: &step.version_description,
                script: &step.down,
            }
        })
        .collect())
}
