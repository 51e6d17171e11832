//! Speculative local effects of commands, valid only until the next applied poll.

use crate::command::Command;
use crate::snapshot::SimulationSnapshot;

/// Smallest food increment the remote grants per `addFood`.
pub const MIN_FOOD_GRANT: u32 = 5;

/// Food the remote is expected to add for `alive_count` living cells.
pub fn food_grant(alive_count: u32) -> u32 {
    MIN_FOOD_GRANT.max(alive_count.saturating_add(MIN_FOOD_GRANT))
}

/// Returns the mirror as it should look right after `command`, or `None` when the
/// command has no visible local effect. An absent mirror predicts from defaults.
pub fn predict(command: &Command, mirror: Option<&SimulationSnapshot>) -> Option<SimulationSnapshot> {
    let current = mirror.cloned().unwrap_or_default();
    match command {
        Command::AddFood => {
            let grant = food_grant(current.alive_count);
            Some(SimulationSnapshot {
                available_food: current.available_food.saturating_add(grant),
                ..current
            })
        }
        Command::KillAll => Some(SimulationSnapshot {
            alive_count: 0,
            available_food: 0,
            cells: Vec::new(),
            food: Vec::new(),
            ..current
        }),
        Command::Start
        | Command::TogglePause
        | Command::Reset
        | Command::AddCell(_)
        | Command::Speed(_) => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::SpeedSetting;
    use crate::snapshot::{CellRecord, CellVariant, FoodItem};

    fn mirror(alive: u32, food: u32) -> SimulationSnapshot {
        SimulationSnapshot {
            alive_count: alive,
            available_food: food,
            cells: (0..alive)
                .map(|id| CellRecord {
                    id: u64::from(id),
                    ..CellRecord::default()
                })
                .collect(),
            food: vec![FoodItem { x: 5.0, y: 5.0 }; food as usize],
            ..SimulationSnapshot::default()
        }
    }

    #[test]
    fn add_food_scales_with_population() {
        let predicted = predict(&Command::AddFood, Some(&mirror(10, 3))).expect("prediction");
        assert_eq!(predicted.available_food, 18);
        assert_eq!(predicted.alive_count, 10);
        assert_eq!(predicted.cells.len(), 10);
    }

    #[test]
    fn add_food_without_population_grants_minimum() {
        let predicted = predict(&Command::AddFood, None).expect("prediction");
        assert_eq!(predicted.available_food, MIN_FOOD_GRANT);

        let predicted = predict(&Command::AddFood, Some(&mirror(0, 2))).expect("prediction");
        assert_eq!(predicted.available_food, 7);
    }

    #[test]
    fn add_food_saturates_instead_of_overflowing() {
        let nearly_full = SimulationSnapshot {
            available_food: u32::MAX - 1,
            ..SimulationSnapshot::default()
        };
        let predicted = predict(&Command::AddFood, Some(&nearly_full)).expect("prediction");
        assert_eq!(predicted.available_food, u32::MAX);
        assert_eq!(food_grant(u32::MAX), u32::MAX);
    }

    #[test]
    fn kill_all_clears_population_and_resources() {
        let predicted = predict(&Command::KillAll, Some(&mirror(4, 9))).expect("prediction");
        assert!(predicted.cells.is_empty());
        assert!(predicted.food.is_empty());
        assert_eq!(predicted.available_food, 0);
        assert_eq!(predicted.alive_count, 0);
    }

    #[test]
    fn other_commands_wait_for_the_next_poll() {
        let current = mirror(2, 2);
        for command in [
            Command::Start,
            Command::TogglePause,
            Command::Reset,
            Command::AddCell(CellVariant::Sexual),
            Command::Speed(SpeedSetting::Fast),
        ] {
            assert!(predict(&command, Some(&current)).is_none(), "{command}");
        }
    }
}
