//! Pedagogical goals
//!
//! A single goal is active at a time. The manager draws new goals from a
//! segment's allowed kinds and adjudicates collected values against the
//! active one.

use std::fmt;

use rand::Rng;
use rand::seq::IndexedRandom;
use serde::{Deserialize, Serialize};

use super::entity::CollectibleValue;
use crate::config::{DifficultyTables, NumberRange};

/// Goal types a segment may allow
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum GoalKind {
    /// Collect the displayed letter
    Letter,
    /// Collect the displayed number
    Number,
    /// Collect that many items
    NumberVisual,
    /// Collect the number equal to `a+b`
    Addition,
    /// Collect `a+b` items
    AdditionVisual,
    /// Collect the number equal to `a-b`
    Subtraction,
    /// Collect `a-b` items
    SubtractionVisual,
}

impl GoalKind {
    pub const ALL: [GoalKind; 7] = [
        GoalKind::Letter,
        GoalKind::Number,
        GoalKind::NumberVisual,
        GoalKind::Addition,
        GoalKind::AdditionVisual,
        GoalKind::Subtraction,
        GoalKind::SubtractionVisual,
    ];

    /// Visual goals count collected items instead of matching one value
    pub fn is_visual(&self) -> bool {
        matches!(
            self,
            GoalKind::NumberVisual | GoalKind::AdditionVisual | GoalKind::SubtractionVisual
        )
    }
}

/// Arithmetic operator of an expression goal
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Operation {
    Add,
    Subtract,
}

impl Operation {
    pub fn symbol(&self) -> char {
        match self {
            Operation::Add => '+',
            Operation::Subtract => '-',
        }
    }
}

/// Expected value of a goal
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GoalValue {
    Letter(char),
    Number(u32),
    Expression { a: u32, op: Operation, b: u32 },
}

/// The active collection objective
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Goal {
    pub kind: GoalKind,
    pub value: GoalValue,
}

impl Goal {
    pub fn letter(c: char) -> Self {
        Self {
            kind: GoalKind::Letter,
            value: GoalValue::Letter(c),
        }
    }

    pub fn number(n: u32) -> Self {
        Self {
            kind: GoalKind::Number,
            value: GoalValue::Number(n),
        }
    }

    pub fn number_visual(n: u32) -> Self {
        Self {
            kind: GoalKind::NumberVisual,
            value: GoalValue::Number(n),
        }
    }

    pub fn addition(a: u32, b: u32) -> Self {
        Self::expression(GoalKind::Addition, a, Operation::Add, b)
    }

    pub fn addition_visual(a: u32, b: u32) -> Self {
        Self::expression(GoalKind::AdditionVisual, a, Operation::Add, b)
    }

    pub fn subtraction(a: u32, b: u32) -> Self {
        Self::expression(GoalKind::Subtraction, a, Operation::Subtract, b)
    }

    pub fn subtraction_visual(a: u32, b: u32) -> Self {
        Self::expression(GoalKind::SubtractionVisual, a, Operation::Subtract, b)
    }

    fn expression(kind: GoalKind, a: u32, op: Operation, b: u32) -> Self {
        Self {
            kind,
            value: GoalValue::Expression { a, op, b },
        }
    }

    /// Numeric answer of the goal (None for letters)
    pub fn target(&self) -> Option<u32> {
        match self.value {
            GoalValue::Letter(_) => None,
            GoalValue::Number(n) => Some(n),
            GoalValue::Expression { a, op: Operation::Add, b } => a.checked_add(b),
            GoalValue::Expression { a, op: Operation::Subtract, b } => a.checked_sub(b),
        }
    }

    /// Items a visual goal needs before it counts as satisfied
    pub fn required_items(&self) -> Option<u32> {
        if self.kind.is_visual() {
            self.target()
        } else {
            None
        }
    }

    /// Text shown to the player: "A", "7", "1+1", "5-2"
    pub fn display_value(&self) -> String {
        match self.value {
            GoalValue::Letter(c) => c.to_string(),
            GoalValue::Number(n) => n.to_string(),
            GoalValue::Expression { a, op, b } => format!("{}{}{}", a, op.symbol(), b),
        }
    }

    /// Whether a collectible value satisfies this goal
    pub fn matches(&self, collected: &CollectibleValue) -> bool {
        match (self.kind, collected) {
            (GoalKind::Letter, CollectibleValue::Letter(c)) => {
                self.value == GoalValue::Letter(*c)
            }
            (GoalKind::Number | GoalKind::Addition | GoalKind::Subtraction, CollectibleValue::Number(n)) => {
                self.target() == Some(*n)
            }
            (kind, CollectibleValue::Item(_)) if kind.is_visual() => true,
            _ => false,
        }
    }
}

impl fmt::Display for Goal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?} {}", self.kind, self.display_value())
    }
}

/// Uniform letter from an alphabet subset
pub fn random_letter<R: Rng>(alphabet: &str, rng: &mut R) -> Option<char> {
    let letters: Vec<char> = alphabet.chars().collect();
    letters.choose(rng).copied()
}

/// Uniform number from an inclusive range
pub fn random_number<R: Rng>(range: NumberRange, rng: &mut R) -> u32 {
    if range.min >= range.max {
        return range.min;
    }
    rng.random_range(range.min..=range.max)
}

/// Draws goals and checks collections against the active one
#[derive(Debug, Clone)]
pub struct GoalManager {
    tables: DifficultyTables,
    current: Option<Goal>,
    difficulty: u8,
}

impl GoalManager {
    pub fn new(tables: DifficultyTables) -> Self {
        Self {
            tables,
            current: None,
            difficulty: 1,
        }
    }

    pub fn current(&self) -> Option<&Goal> {
        self.current.as_ref()
    }

    pub fn difficulty(&self) -> u8 {
        self.difficulty
    }

    pub fn tables(&self) -> &DifficultyTables {
        &self.tables
    }

    /// Replace the active goal directly (scripted goals, restores)
    pub fn set_goal(&mut self, goal: Goal) {
        self.current = Some(goal);
    }

    /// Draw a new goal of one of `available` kinds at `difficulty`.
    ///
    /// Returns None (and keeps the previous goal) when `available` is empty
    /// or the difficulty has no table entry.
    pub fn set_new_goal<R: Rng>(
        &mut self,
        available: &[GoalKind],
        difficulty: u8,
        rng: &mut R,
    ) -> Option<Goal> {
        let Some(&kind) = available.choose(rng) else {
            log::warn!("No goal kinds available at difficulty {}", difficulty);
            return None;
        };
        let Some(range) = self.tables.numbers(difficulty) else {
            log::warn!("No number range for difficulty {}", difficulty);
            return None;
        };

        let goal = match kind {
            GoalKind::Letter => {
                let alphabet = self.tables.letters(difficulty)?;
                Goal::letter(random_letter(alphabet, rng)?)
            }
            GoalKind::Number => Goal::number(random_number(range, rng)),
            GoalKind::NumberVisual => Goal::number_visual(random_number(range, rng)),
            GoalKind::Addition | GoalKind::AdditionVisual => {
                // Leave room for b >= 1 so a+b never exceeds the range max
                let a = random_number(
                    NumberRange {
                        min: range.min,
                        max: range.max.saturating_sub(1).max(range.min),
                    },
                    rng,
                );
                let b = random_number(
                    NumberRange {
                        min: 1,
                        max: range.max.saturating_sub(a).max(1),
                    },
                    rng,
                );
                if kind == GoalKind::Addition {
                    Goal::addition(a, b)
                } else {
                    Goal::addition_visual(a, b)
                }
            }
            GoalKind::Subtraction | GoalKind::SubtractionVisual => {
                let a = random_number(
                    NumberRange {
                        min: range.min.max(2),
                        max: range.max.max(2),
                    },
                    rng,
                );
                let b = random_number(NumberRange { min: 1, max: a - 1 }, rng);
                if kind == GoalKind::Subtraction {
                    Goal::subtraction(a, b)
                } else {
                    Goal::subtraction_visual(a, b)
                }
            }
        };

        self.difficulty = difficulty;
        self.current = Some(goal);
        Some(goal)
    }

    /// Pure check of a collected value against the active goal
    pub fn check_goal_achievement(&self, collected: &CollectibleValue) -> bool {
        self.current
            .as_ref()
            .map(|goal| goal.matches(collected))
            .unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::entity::ItemKind;
    use proptest::prelude::*;
    use rand::SeedableRng;
    use rand_pcg::Pcg32;

    fn manager() -> GoalManager {
        GoalManager::new(DifficultyTables::default())
    }

    #[test]
    fn test_subtraction_goal_matches_difference() {
        let mut goals = manager();
        goals.set_goal(Goal::subtraction(5, 2));
        assert_eq!(goals.current().map(|g| g.display_value()), Some("5-2".to_string()));

        assert!(goals.check_goal_achievement(&CollectibleValue::Number(3)));
        assert!(!goals.check_goal_achievement(&CollectibleValue::Number(2)));
    }

    #[test]
    fn test_letter_goal_exact_match() {
        let mut goals = manager();
        goals.set_goal(Goal::letter('B'));
        assert!(goals.check_goal_achievement(&CollectibleValue::Letter('B')));
        assert!(!goals.check_goal_achievement(&CollectibleValue::Letter('b')));
        assert!(!goals.check_goal_achievement(&CollectibleValue::Number(2)));
    }

    #[test]
    fn test_unrelated_types_do_not_match() {
        let mut goals = manager();
        goals.set_goal(Goal::number(4));
        assert!(!goals.check_goal_achievement(&CollectibleValue::Letter('D')));
        assert!(!goals.check_goal_achievement(&CollectibleValue::Item(ItemKind::Apple)));

        goals.set_goal(Goal::addition(2, 2));
        assert!(goals.check_goal_achievement(&CollectibleValue::Number(4)));
        assert!(!goals.check_goal_achievement(&CollectibleValue::Item(ItemKind::Gem)));
    }

    #[test]
    fn test_visual_goals_accept_any_item() {
        let mut goals = manager();
        for goal in [
            Goal::number_visual(3),
            Goal::addition_visual(1, 2),
            Goal::subtraction_visual(4, 1),
        ] {
            goals.set_goal(goal);
            assert!(goals.check_goal_achievement(&CollectibleValue::Item(ItemKind::Cherry)));
            assert!(!goals.check_goal_achievement(&CollectibleValue::Number(3)));
            assert_eq!(goal.required_items(), Some(3));
        }
    }

    #[test]
    fn test_no_goal_never_matches() {
        let goals = manager();
        assert!(!goals.check_goal_achievement(&CollectibleValue::Letter('A')));
    }

    #[test]
    fn test_failed_checks_do_not_mutate_goal() {
        let mut goals = manager();
        goals.set_goal(Goal::letter('C'));
        for _ in 0..10 {
            assert!(!goals.check_goal_achievement(&CollectibleValue::Letter('A')));
        }
        assert_eq!(goals.current(), Some(&Goal::letter('C')));
    }

    #[test]
    fn test_empty_kinds_keeps_previous_goal() {
        let mut goals = manager();
        let mut rng = Pcg32::seed_from_u64(1);
        goals.set_goal(Goal::number(2));
        assert!(goals.set_new_goal(&[], 1, &mut rng).is_none());
        assert_eq!(goals.current(), Some(&Goal::number(2)));
    }

    #[test]
    fn test_letter_goal_uses_difficulty_alphabet() {
        let mut goals = manager();
        let mut rng = Pcg32::seed_from_u64(7);
        for _ in 0..50 {
            let goal = goals
                .set_new_goal(&[GoalKind::Letter], 1, &mut rng)
                .expect("letter goal");
            match goal.value {
                GoalValue::Letter(c) => assert!("ABC".contains(c)),
                other => panic!("unexpected value {:?}", other),
            }
        }
    }

    #[test]
    fn test_display_formats() {
        assert_eq!(Goal::letter('A').display_value(), "A");
        assert_eq!(Goal::number(7).display_value(), "7");
        assert_eq!(Goal::addition(1, 1).display_value(), "1+1");
    }

    proptest! {
        #[test]
        fn addition_stays_within_range(seed in any::<u64>(), difficulty in 1u8..=9) {
            let mut goals = manager();
            let mut rng = Pcg32::seed_from_u64(seed);
            let range = DifficultyTables::default().numbers(difficulty).unwrap();
            let goal = goals.set_new_goal(&[GoalKind::Addition], difficulty, &mut rng).unwrap();
            let GoalValue::Expression { a, op, b } = goal.value else {
                panic!("expected expression");
            };
            prop_assert_eq!(op, Operation::Add);
            prop_assert!(a >= range.min && a <= range.max);
            prop_assert!(b >= 1 && b <= range.max - a);
            prop_assert!(a + b <= range.max);
        }

        #[test]
        fn subtraction_stays_non_negative(seed in any::<u64>(), difficulty in 1u8..=9) {
            let mut goals = manager();
            let mut rng = Pcg32::seed_from_u64(seed);
            let goal = goals
                .set_new_goal(&[GoalKind::Subtraction, GoalKind::SubtractionVisual], difficulty, &mut rng)
                .unwrap();
            let GoalValue::Expression { a, b, .. } = goal.value else {
                panic!("expected expression");
            };
            prop_assert!(b >= 1 && b < a);
            prop_assert!(goal.target().unwrap() >= 1);
        }
    }
}
