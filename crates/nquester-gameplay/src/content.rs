//! Built-in game content: the default quest catalog and NPC roster.

use crate::catalog::{ChallengeParams, Difficulty, QuestCatalog, QuestCategory, QuestDefinition};
use crate::npc::{DialogueCategory, Npc, NpcRole, NpcRoster};
use nquester_common::{NpcId, QuestId};
use tracing::warn;

/// Currency target that wins the game.
pub const TARGET_USERS: i64 = 10_000;

/// Reward hint shown by student NPCs.
pub const STUDENT_REWARD_HINT: i64 = 100;

const MENTOR_QUESTS: usize = 11;
const STUDENT_QUESTS: usize = 10;

/// Reward hint shown by mentor NPCs: what is left of the target after the
/// student quests, split between mentors.
pub const MENTOR_REWARD_HINT: i64 =
    (TARGET_USERS - STUDENT_QUESTS as i64 * STUDENT_REWARD_HINT) / MENTOR_QUESTS as i64;

/// Generic line shown after a failed minigame.
pub const RETRY_FAILURE_LINE: &str = "Didn't work out! Give it another go!";

/// Line shown after losing a boss battle.
pub const BOSS_FAILURE_LINE: &str = "The boss was stronger this time! Try again!";

fn mentor(
    id: &str,
    npc: &str,
    title: &str,
    minigame: &str,
    category: QuestCategory,
    reward: i64,
    item: &str,
) -> QuestDefinition {
    QuestDefinition::new(id, npc, title, ChallengeParams::minigame(minigame))
        .with_category(category)
        .with_reward(reward, Some(item))
        .with_failure_line(RETRY_FAILURE_LINE)
}

fn student(
    id: &str,
    npc: &str,
    title: &str,
    challenge: ChallengeParams,
    reward: i64,
    item: &str,
) -> QuestDefinition {
    QuestDefinition::new(id, npc, title, challenge)
        .with_reward(reward, Some(item))
        .with_failure_line(RETRY_FAILURE_LINE)
}

/// Every built-in quest definition, in the order NPCs are placed on the map.
#[must_use]
pub fn default_definitions() -> Vec<QuestDefinition> {
    vec![
        mentor("quest_alikhan_01", "Alikhan", "Swift Debug Showdown", "swift_debug", QuestCategory::Swift, 500, "iOS Certificate")
            .with_start_lines(&["There's a bug in my iOS code.", "Find it in 15 seconds!"])
            .with_complete_line("Great! Debugging skills on point!")
            .with_feedback(&[
                "The code is stable now!",
                "Thanks for the iOS help! The app stopped crashing!",
            ]),
        mentor("quest_alibeck_01", "Alibeck", "Train Your Brain", "ai_training", QuestCategory::Ai, 800, "AI Insight")
            .with_start_lines(&["Time to train the neural net!", "Drag the cat data into the model."])
            .with_complete_line("Model trained! Cats recognised at 99%!")
            .with_feedback(&["The AI works perfectly now!", "The model got much smarter!"]),
        mentor("quest_bahredin_01", "Bahredin", "Strict Mode Madness", "ts_quiz", QuestCategory::TypeScript, 600, "Type Safety Certificate")
            .with_start_lines(&["I found `any` in our codebase.", "This is not a request. This is an emergency."])
            .with_complete_line("Thank you. The codebase is safe.")
            .with_feedback(&["TypeScript is strict again!", "No more any! The codebase is saved!"]),
        mentor("quest_bahaudin_01", "Bahaudin", "Memory Leak Hunter", "memory_leak_hunter", QuestCategory::Backend, 400, "Backend Certificate")
            .with_start_lines(&["The server goes down every 5 minutes.", "Find the memory leak!"])
            .with_complete_line("The server is stable! Thanks!")
            .with_feedback(&["The server no longer crashes!", "Memory is used efficiently now!"]),
        mentor("quest_gaziz_01", "Gaziz", "React Debug Challenge", "react_debug", QuestCategory::Frontend, 350, "Frontend Certificate")
            .with_start_lines(&["A React component refuses to render.", "Check the props and the state!"])
            .with_complete_line("The component works! Frontend saved!")
            .with_feedback(&["The React component works perfectly now!"]),
        mentor("quest_shoqan_01", "Shoqan", "Frontend Debug Master", "react_debug", QuestCategory::Frontend, 450, "Frontend Certificate")
            .with_start_lines(&["I have a problem with a React component.", "Find and fix the JavaScript bugs!"])
            .with_complete_line("The component works! Frontend dev at its best!")
            .with_feedback(&["The JavaScript is fixed!", "A true frontend expert!"]),
        mentor("quest_zhasulan_01", "Zhasulan", "iOS Debug Challenge", "swift_debug", QuestCategory::Swift, 400, "iOS Certificate")
            .with_start_lines(&["The CI/CD pipeline is broken.", "Fix the deploy configuration!"])
            .with_complete_line("The iOS app works! Great job!")
            .with_feedback(&["The Swift code is fixed!", "A real iOS developer!"]),
        mentor("quest_aimurat_01", "Aimurat", "AI Model Training", "ai_training", QuestCategory::Ai, 600, "AI Certificate")
            .with_start_lines(&["Find every bug in the code.", "Run a full test pass!"])
            .with_complete_line("The model is trained! The AI works great!")
            .with_feedback(&["The AI model trained successfully!", "A true AI/ML expert!"]),
        mentor("quest_bernar_01", "Bernar", "BOSS: Final Challenge", "boss_challenge", QuestCategory::General, 2000, "BOSS Certificate")
            .with_start_lines(&[
                "You think you're ready for the final trial?",
                "Prove you deserve to be the best founder!",
                "Architecture, coding, testing: pass every stage!",
            ])
            .with_complete_line("Impressive! You passed the final trial!")
            .with_feedback(&["A REAL BOSS! You passed every trial!", "Investors will love you!"]),
        QuestDefinition::new("quest_final_boss", "FinalBoss", "FINAL BOSS", ChallengeParams::BossBattle)
            .with_difficulty(Difficulty::Boss)
            .with_reward(5000, Some("Legendary Certificate"))
            .with_start_lines(&[
                "You think you're ready for the real trial?",
                "Face the final boss in an epic battle!",
                "The more users you have, the weaker the boss!",
            ])
            .with_complete_line("UNBELIEVABLE! You beat the final boss!")
            .with_failure_line(BOSS_FAILURE_LINE)
            .with_feedback(&["LEGEND! You beat the final boss!", "You are a true hero!"]),
        mentor("quest_diana_frontend", "Diana", "Frontend Designer", "ui_designer", QuestCategory::Frontend, 700, "Frontend Certificate")
            .with_start_lines(&[
                "Hi! I'm Diana, I do frontend.",
                "I need a hand building a beautiful interface.",
                "Beat the 'UI/UX Designer' minigame and build a responsive layout!",
            ])
            .with_complete_line("Great work! You're a real designer!")
            .with_feedback(&["UI/UX DESIGNER!", "Diana is happy with your skills!"])
            .with_follow_up("quest_diana_collector"),
        QuestDefinition::new(
            "quest_diana_collector",
            "Diana",
            "Diana's Collection",
            ChallengeParams::collection(["Frontend Certificate", "Backend Certificate", "iOS Certificate"]),
        )
        .with_category(QuestCategory::Frontend)
        .with_reward(600, Some("Design Artifact"))
        .with_start_lines(&[
            "I collect certificates from every track.",
            "Bring me frontend, backend and iOS certificates!",
        ])
        .with_complete_line("All artifacts collected!")
        .with_feedback(&["All artifacts collected!", "My collection is complete!"])
        .with_follow_up("quest_diana_final"),
        QuestDefinition::new("quest_diana_final", "Diana", "Treasure Collector", ChallengeParams::minigame("treasure_collector"))
            .with_category(QuestCategory::Frontend)
            .with_difficulty(Difficulty::Hard)
            .with_reward(900, Some("Diana's Main Artifact"))
            .with_failure_line(RETRY_FAILURE_LINE)
            .with_start_lines(&[
                "Now that you have my collection...",
                "Show me you deserve my main artifact!",
                "Find every hidden artifact before time runs out!",
            ])
            .with_complete_line("The artifact is yours!")
            .with_feedback(&["You found every artifact!"]),
        mentor("quest_tamyrlan_backend", "Tamyrlan", "Backend Architect", "api_architect", QuestCategory::Backend, 800, "Backend Certificate")
            .with_start_lines(&[
                "Hi! I'm Tamyrlan, I design backends.",
                "I need help building a scalable system.",
                "Beat the 'API Architect' minigame and design a REST API!",
            ])
            .with_complete_line("Great work! You're a real architect!")
            .with_feedback(&["API ARCHITECT!", "Tamyrlan is happy with your skills!"]),
        student("quest_student_tired", "tired_student", "Burnout Simulator", ChallengeParams::fetch("water_bottle"), 300, "Energy Drink")
            .with_start_lines(&["I think I can hear colours...", "Could you find me a water bottle?"])
            .with_complete_line("Ah, hydration. I feel slightly more human.")
            .with_feedback(&["Thanks for the water! Back to coding!"]),
        student("quest_student_coffee", "coffee_student", "Coffee Clicker", ChallengeParams::clicker(50, 30), 200, "Coffee")
            .with_start_lines(&["I need coffee! Lots of coffee!", "Click 50 times in 30 seconds!"])
            .with_complete_line("Coffee's ready! Now I can code!")
            .with_feedback(&["Coffee saved my day!"]),
        student("quest_student_coding", "coding_student", "Catch the Cat!", ChallengeParams::minigame("treasure_collector"), 400, "Cat Certificate")
            .with_start_lines(&["I need a cat for my project!", "Catch every cat on the map!"])
            .with_complete_line("Cats caught! Project saved!")
            .with_feedback(&["Cats are the best testers!"]),
        student("quest_student_hungry", "hungry_student", "Hungry Student", ChallengeParams::fetch("pizza"), 250, "Pizza")
            .with_start_lines(&["I'm hungry! So hungry!", "Bring me a pizza!"])
            .with_complete_line("Pizza! Thanks! Now I can work!")
            .with_feedback(&["Pizza is the best programmer food!"]),
        student("quest_student_sleepy", "sleepy_student", "Sleepy Student", ChallengeParams::fetch("pillow"), 150, "Pillow")
            .with_start_lines(&["I'm so tired...", "Find me a pillow!"])
            .with_complete_line("A pillow! Now I can rest!")
            .with_feedback(&["Sleep is part of programming!"]),
        student("quest_student_gaming", "gaming_student", "Gamer Clicker", ChallengeParams::clicker(100, 20), 350, "Gaming Certificate")
            .with_start_lines(&["I need to level up my character!", "Click 100 times in 20 seconds!"])
            .with_complete_line("Character levelled up!")
            .with_feedback(&["Gamification is the future of learning!"]),
        student(
            "quest_student_music",
            "music_student",
            "Music Rhythm",
            ChallengeParams::Rhythm { beats_needed: 20, time_limit_secs: 30 },
            300,
            "Music Certificate",
        )
        .with_start_lines(&["I need music to code!", "Click on the beat!"])
        .with_complete_line("Great rhythm! Music is inspiring!")
        .with_feedback(&["Now I code to the beat!"]),
        student("quest_student_sport", "sport_student", "Sport Challenge", ChallengeParams::clicker(30, 45), 200, "Sport Certificate")
            .with_start_lines(&["I need to stretch!", "Do 30 push-ups (clicks)!"])
            .with_complete_line("Great! I'm in shape now!")
            .with_feedback(&["Sport matters for programmers too!"]),
        student(
            "quest_student_art",
            "art_student",
            "Artistic Taste",
            ChallengeParams::ColorPicker { colors_needed: 5, time_limit_secs: 60 },
            250,
            "Art Certificate",
        )
        .with_start_lines(&["I need some inspiring art!", "Find beautiful colours!"])
        .with_complete_line("Beautiful colours! I'm inspired!")
        .with_feedback(&["Art is part of design!"]),
        student("quest_student_book", "book_student", "Bookworm", ChallengeParams::fetch("book"), 180, "Book")
            .with_start_lines(&["I need a new programming book!", "Bring me a book!"])
            .with_complete_line("A book! Now I'm smarter!")
            .with_feedback(&["Books are the best teachers!"]),
    ]
}

/// The built-in quest catalog.
#[must_use]
pub fn default_catalog() -> QuestCatalog {
    match QuestCatalog::from_definitions(default_definitions()) {
        Ok(catalog) => catalog,
        Err(e) => {
            warn!("Built-in catalog failed validation: {e}");
            QuestCatalog::new()
        },
    }
}

const ROSTER: &[(&str, NpcRole, DialogueCategory, &str)] = &[
    ("Alikhan", NpcRole::Mentor, DialogueCategory::General, "quest_alikhan_01"),
    ("Alibeck", NpcRole::Mentor, DialogueCategory::General, "quest_alibeck_01"),
    ("Bahredin", NpcRole::Mentor, DialogueCategory::General, "quest_bahredin_01"),
    ("Bahaudin", NpcRole::Mentor, DialogueCategory::General, "quest_bahaudin_01"),
    ("Gaziz", NpcRole::Mentor, DialogueCategory::General, "quest_gaziz_01"),
    ("Shoqan", NpcRole::Mentor, DialogueCategory::General, "quest_shoqan_01"),
    ("Zhasulan", NpcRole::Mentor, DialogueCategory::General, "quest_zhasulan_01"),
    ("Aimurat", NpcRole::Mentor, DialogueCategory::General, "quest_aimurat_01"),
    ("Bernar", NpcRole::Mentor, DialogueCategory::General, "quest_bernar_01"),
    ("Diana", NpcRole::Mentor, DialogueCategory::General, "quest_diana_frontend"),
    ("Tamyrlan", NpcRole::Mentor, DialogueCategory::General, "quest_tamyrlan_backend"),
    ("FinalBoss", NpcRole::Boss, DialogueCategory::General, "quest_final_boss"),
    ("tired_student", NpcRole::Student, DialogueCategory::Tired, "quest_student_tired"),
    ("coding_student", NpcRole::Student, DialogueCategory::Coding, "quest_student_coding"),
    ("coffee_student", NpcRole::Student, DialogueCategory::Coffee, "quest_student_coffee"),
    ("hungry_student", NpcRole::Student, DialogueCategory::General, "quest_student_hungry"),
    ("sleepy_student", NpcRole::Student, DialogueCategory::General, "quest_student_sleepy"),
    ("gaming_student", NpcRole::Student, DialogueCategory::General, "quest_student_gaming"),
    ("music_student", NpcRole::Student, DialogueCategory::General, "quest_student_music"),
    ("sport_student", NpcRole::Student, DialogueCategory::General, "quest_student_sport"),
    ("art_student", NpcRole::Student, DialogueCategory::General, "quest_student_art"),
    ("book_student", NpcRole::Student, DialogueCategory::General, "quest_student_book"),
];

/// The built-in NPC roster with opening quests assigned from `catalog`.
///
/// NPCs whose quest is missing from the catalog are placed without one.
#[must_use]
pub fn default_roster(catalog: &QuestCatalog) -> NpcRoster {
    let mut roster = NpcRoster::new();
    for &(name, role, category, quest_id) in ROSTER {
        let mut npc = Npc::new(NpcId::new(name), role).with_dialogue_category(category);
        if let Some(quest) = catalog.get(quest_id) {
            let hint = match role {
                NpcRole::Student => STUDENT_REWARD_HINT,
                NpcRole::Mentor | NpcRole::Boss => MENTOR_REWARD_HINT,
            };
            npc.assign_quest(QuestId::new(quest_id), quest.dialogue.start.clone(), hint);
        }
        roster.insert(npc);
    }
    roster
}

/// Thank-you lines a mentor says after their quest is done.
#[must_use]
pub fn completion_lines(npc: &str) -> &'static [&'static str] {
    match npc {
        "Alikhan" => &[
            "Great work! You're a real Swift master!",
            "You saved our mobile project!",
        ],
        "Alibeck" => &[
            "Impressive! The AI runs like clockwork!",
            "You turned our AI into a genius!",
        ],
        "Bahredin" => &[
            "The codebase is safe now!",
            "No more any! You saved the project!",
        ],
        "Bahaudin" => &[
            "The server doesn't crash any more!",
            "You're a real backend expert!",
        ],
        "Gaziz" => &[
            "The React component works perfectly!",
            "You turned our UI into a work of art!",
        ],
        "Shoqan" => &[
            "The mobile app is stable!",
            "You made our app the best in the store!",
        ],
        "Zhasulan" => &[
            "The iOS app is stable now!",
            "The app runs like clockwork!",
        ],
        "Aimurat" => &[
            "The AI model trained successfully!",
            "You're a real AI/ML expert!",
        ],
        "Bernar" => &[
            "You passed every trial!",
            "A REAL BOSS! Investors will be thrilled!",
        ],
        _ => &["Thanks for the help! Great work!"],
    }
}
