//! Loading screen tips and programmer memes.

use nquester_common::Dice;

/// Tips shown while loading.
pub const TIPS: &[&str] = &[
    "Tip: coffee plus an energy drink makes a super programmer",
    "Tip: the best code is code that works",
    "Tip: git commit -m 'fix' solves every problem",
    "Tip: Stack Overflow is a developer's best friend",
    "Tip: Ctrl+C, Ctrl+V is the foundation of programming",
    "Tip: it's not a bug, it's a feature",
    "Tip: more comments always means better code",
    "Tip: Python is the best language for everything",
    "Tip: JavaScript is the language of the future",
    "Tip: Rust puts safety first",
];

/// Meme references shown while loading.
pub const MEMES: &[&str] = &[
    "'It just works' - Todd Howard",
    "'Hello World' - the first step to success",
    "'99 little bugs in the code...'",
    "'Stack Overflow is my documentation'",
    "'I don't always test my code, but when I do...'",
    "'Real programmers count from 0'",
    "'There are 10 types of people...'",
    "'Why do programmers prefer dark mode?'",
    "'It's not a bug, it's an undocumented feature'",
    "'The best code is no code'",
];

/// Picks a random tip.
pub fn random_tip(dice: &mut dyn Dice) -> &'static str {
    TIPS[dice.pick(TIPS.len())]
}

/// Picks a random meme.
pub fn random_meme(dice: &mut dyn Dice) -> &'static str {
    MEMES[dice.pick(MEMES.len())]
}

#[cfg(test)]
mod tests {
    use super::*;
    use nquester_common::ScriptedDice;

    #[test]
    fn test_tip_follows_dice() {
        let mut dice = ScriptedDice::new(vec![0.0, 0.95]);
        assert_eq!(random_tip(&mut dice), TIPS[0]);
        assert_eq!(random_tip(&mut dice), TIPS[9]);
    }

    #[test]
    fn test_meme_in_range() {
        let mut rng = fastrand::Rng::with_seed(3);
        for _ in 0..50 {
            assert!(MEMES.contains(&random_meme(&mut rng)));
        }
    }
}
