use nquester_common::{QuestId, ScriptedDice};
use nquester_gameplay::{
    default_catalog, provider_fn, ChallengeKind, ChallengeMetrics, ChallengeParams, ChallengeReport,
    Difficulty, EventManager, GameMode, GameSignal, PlayerProgress, ProgressTracker, QuestCatalog,
    QuestDefinition, QuestError, QuestManager, QuestStatus, RewardSystem, Session, SessionConfig,
    SessionSnapshot,
};
use proptest::prelude::*;

// Rolls above every item drop chance.
const NO_DROP: f32 = 0.99;

fn single_quest_catalog() -> QuestCatalog {
    QuestCatalog::from_definitions(vec![QuestDefinition::new(
        "q1",
        "mentor",
        "First Quest",
        ChallengeParams::minigame("clicker"),
    )
    .with_reward(100, None)])
    .expect("catalog should be valid")
}

fn quiet_session() -> Session {
    let config = SessionConfig {
        target_users: 1_000_000,
        ..SessionConfig::default().with_seed(42).with_events(false)
    };
    Session::with_default_content(config).with_dice(ScriptedDice::constant(NO_DROP))
}

fn pass_every_challenge(session: &mut Session) {
    for kind in ChallengeKind::ALL {
        if matches!(kind, ChallengeKind::Fetch | ChallengeKind::ItemCollection) {
            continue;
        }
        session.register_provider(
            kind,
            provider_fn(|_| Ok(ChallengeReport::passed(ChallengeMetrics::timed(8.0)))),
        );
    }
}

#[test]
fn property_1_unknown_ids_fail_without_mutation() {
    let mut manager = QuestManager::new(default_catalog());
    let mut player = PlayerProgress::with_currency(50);
    let before = player.clone();
    let rewards = RewardSystem::new();
    let mut dice = ScriptedDice::constant(NO_DROP);

    assert!(matches!(
        manager.start_quest("unknown", &mut player),
        Err(QuestError::NotFound(_))
    ));
    assert!(manager
        .complete_quest("unknown", &mut player, &rewards, &mut dice)
        .is_err());
    assert!(manager.fail_quest("unknown", &mut player).is_err());
    assert!(manager.get_quest_data("unknown").is_err());

    assert_eq!(player, before);
    assert_eq!(manager.instances().count(), 0);
}

#[test]
fn property_2_start_mark_complete_pays_at_least_base() {
    let mut manager = QuestManager::new(default_catalog());
    let mut player = PlayerProgress::new();
    let rewards = RewardSystem::new();
    let mut dice = ScriptedDice::constant(NO_DROP);

    manager
        .start_quest("quest_alikhan_01", &mut player)
        .expect("start should succeed");
    manager
        .mark_challenge_completed("quest_alikhan_01")
        .expect("mark should succeed");
    manager
        .complete_quest("quest_alikhan_01", &mut player, &rewards, &mut dice)
        .expect("complete should succeed");

    assert!(player.has_completed("quest_alikhan_01"));
    assert!(!player.is_active("quest_alikhan_01"));
    assert!(player.currency() >= 100);
}

#[test]
fn property_3_second_completion_fails() {
    let mut manager = QuestManager::new(single_quest_catalog());
    let mut player = PlayerProgress::new();
    let rewards = RewardSystem::new();
    let mut dice = ScriptedDice::constant(NO_DROP);

    manager.start_quest("q1", &mut player).expect("start should succeed");
    manager
        .complete_quest("q1", &mut player, &rewards, &mut dice)
        .expect("complete should succeed");
    let currency = player.currency();

    assert!(matches!(
        manager.complete_quest("q1", &mut player, &rewards, &mut dice),
        Err(QuestError::AlreadyCompleted(_))
    ));
    assert!(matches!(
        manager.start_quest("q1", &mut player),
        Err(QuestError::AlreadyCompleted(_))
    ));
    assert_eq!(player.currency(), currency);
    assert_eq!(player.completed_quests().len(), 1);
}

#[test]
fn property_7_single_quest_catalog_pays_exactly_base() {
    let mut manager = QuestManager::new(single_quest_catalog());
    let mut player = PlayerProgress::new();
    let rewards = RewardSystem::new();
    let mut dice = ScriptedDice::constant(NO_DROP);

    manager.start_quest("q1", &mut player).expect("start should succeed");
    let outcome = manager
        .complete_quest("q1", &mut player, &rewards, &mut dice)
        .expect("complete should succeed");

    assert_eq!(outcome.currency, 100);
    assert!(outcome.bonus_item.is_none());
    assert_eq!(player.currency(), 100);
    assert_eq!(player.completed_quests(), &[QuestId::new("q1")]);
    assert!(player.active_quests().is_empty());
}

#[test]
fn property_8_start_unknown_leaves_state_unchanged() {
    let mut manager = QuestManager::new(default_catalog());
    let mut player = PlayerProgress::with_currency(25);
    let rewards = RewardSystem::new();
    let mut dice = ScriptedDice::constant(NO_DROP);

    manager
        .start_quest("quest_gaziz_01", &mut player)
        .expect("start should succeed");
    let player_before = player.clone();

    assert!(matches!(
        manager.start_quest("unknown", &mut player),
        Err(QuestError::NotFound(_))
    ));
    assert_eq!(player, player_before);
    assert_eq!(manager.instances().count(), 1);
    assert_eq!(manager.status("quest_gaziz_01"), QuestStatus::Active);
    assert_eq!(manager.attempts("quest_gaziz_01"), 1);

    // the same manager and player carry on normally
    manager
        .mark_challenge_completed("quest_gaziz_01")
        .expect("mark should succeed");
    let outcome = manager
        .complete_quest("quest_gaziz_01", &mut player, &rewards, &mut dice)
        .expect("complete should succeed");
    assert_eq!(player.currency(), 25 + outcome.currency);
    assert_eq!(player.completed_quests(), &[QuestId::new("quest_gaziz_01")]);
    assert!(player.active_quests().is_empty());
    assert!(manager.instance("unknown").is_none());
}

#[test]
fn property_9_one_event_per_interval_then_pruned() {
    let mut events = EventManager::new(60.0);
    let mut dice = ScriptedDice::constant(0.0);

    let mut triggered = 0;
    for _ in 0..61 {
        if events.update(1.0, &mut dice).is_some() {
            triggered += 1;
        }
    }
    assert_eq!(triggered, 1);
    assert_eq!(events.active_events().len(), 1);

    let duration = events.active_events()[0].def.duration_secs;
    let started = events.active_events()[0].started_at;
    while events.clock() < started + duration - 1.0 {
        events.update(1.0, &mut dice);
    }
    assert_eq!(events.active_events().len(), 1);

    events.update(1.0, &mut dice);
    assert!(events.active_events().is_empty());
}

#[test]
fn e2e_full_playthrough_reaches_hundred_percent() {
    let mut session = quiet_session();
    pass_every_challenge(&mut session);

    let needed: Vec<_> = session
        .quests()
        .catalog()
        .iter()
        .flat_map(|definition| definition.challenge.consumed_items())
        .collect();
    for item in needed {
        session.pick_up_item(item);
    }

    let npc_ids: Vec<String> = session.npcs().iter().map(|npc| npc.id().to_string()).collect();
    let mut last = session.completion_percentage();
    for npc in &npc_ids {
        loop {
            let interaction = session.interact(npc).expect("interact should succeed");
            if interaction.quest_id().is_none() {
                session.close_dialogue();
                break;
            }
            let flow = session.accept_quest().expect("accept should succeed");
            assert!(flow.is_success(), "{} should pass", flow.quest_id);
            session.close_dialogue();

            let pct = session.completion_percentage();
            assert!(pct >= last);
            assert!((0.0..=100.0).contains(&pct));
            last = pct;
        }
    }

    let total = session.quests().catalog().len();
    assert_eq!(session.player().completed_quests().len(), total);
    assert!((session.completion_percentage() - 100.0).abs() < f32::EPSILON);
    assert!(session.player().active_quests().is_empty());

    for npc in session.npcs().iter() {
        if let Some(quest_id) = npc.quest_id() {
            assert_eq!(
                npc.is_completed(),
                session.player().has_completed(quest_id.as_str()),
                "{} mirrors its quest",
                npc.id()
            );
        }
    }
}

#[test]
fn e2e_signals_follow_quest_flow() {
    let mut session = quiet_session();
    pass_every_challenge(&mut session);

    session.interact("Gaziz").expect("interact should succeed");
    session.accept_quest().expect("accept should succeed");
    session.close_dialogue();
    session.update(0.016);

    let names: Vec<_> = session
        .drain_signals()
        .iter()
        .map(GameSignal::name)
        .collect();
    assert_eq!(
        names,
        vec![
            "quest_started",
            "quest_completed",
            "reward_item_granted",
            "achievement_unlocked",
            "achievement_unlocked",
        ]
    );
}

#[test]
fn e2e_cancelled_boss_battle_is_retryable() {
    let mut session = quiet_session();
    session.register_provider(
        ChallengeKind::BossBattle,
        provider_fn(|_| Err(nquester_gameplay::ChallengeError::Cancelled)),
    );

    session.interact("FinalBoss").expect("interact should succeed");
    let flow = session.accept_quest().expect("accept should succeed");
    assert!(!flow.is_success());
    assert_eq!(
        session.quests().status("quest_final_boss"),
        QuestStatus::Failed
    );
    assert_eq!(session.mode(), GameMode::Dialogue);
    assert!(!session.dialogue_lines().is_empty());
    session.close_dialogue();

    session.register_provider(
        ChallengeKind::BossBattle,
        provider_fn(|_| Ok(ChallengeReport::passed(ChallengeMetrics::default()))),
    );
    session.interact("FinalBoss").expect("interact should succeed");
    let flow = session.accept_quest().expect("accept should succeed");
    let reward = flow.reward.expect("boss pays out");
    let base = session
        .quests()
        .get_quest_data("quest_final_boss")
        .expect("boss quest exists")
        .reward
        .currency;
    assert_eq!(reward.currency, base * 3);
}

#[test]
fn e2e_snapshot_file_restores_session() {
    let mut session = quiet_session();
    pass_every_challenge(&mut session);
    session.interact("Bahredin").expect("interact should succeed");
    session.accept_quest().expect("accept should succeed");
    session.close_dialogue();
    session.interact("Alibeck").expect("interact should succeed");
    session.close_dialogue();

    let dir = tempfile::tempdir().expect("tempdir should be created");
    let path = dir.path().join("save.nqs");
    session.snapshot().save_to(&path).expect("save should succeed");

    let loaded = SessionSnapshot::load_from(&path).expect("load should succeed");
    let mut restored = quiet_session();
    restored.restore(&loaded);

    assert_eq!(restored.snapshot(), session.snapshot());
    assert!(restored.npc("Alibeck").is_some_and(|npc| npc.is_met()));
    assert_eq!(
        restored.quests().status("quest_bahredin_01"),
        QuestStatus::Completed
    );
}

proptest! {
    #[test]
    fn property_4_attempts_grow_once_per_failure(failures in 0u32..6) {
        let mut manager = QuestManager::new(single_quest_catalog());
        let mut player = PlayerProgress::new();
        let rewards = RewardSystem::new();
        let mut dice = ScriptedDice::constant(NO_DROP);

        for n in 0..failures {
            manager.start_quest("q1", &mut player).expect("start should succeed");
            prop_assert_eq!(manager.attempts("q1"), n + 1);
            manager.fail_quest("q1", &mut player).expect("fail should succeed");
            prop_assert!(!player.is_active("q1"));
        }

        manager.start_quest("q1", &mut player).expect("restart should succeed");
        manager.complete_quest("q1", &mut player, &rewards, &mut dice).expect("complete should succeed");
        prop_assert_eq!(manager.attempts("q1"), failures + 1);
        prop_assert_eq!(player.currency(), 100);
    }

    #[test]
    fn property_5_percentage_monotone_and_bounded(
        total in 1usize..30,
        attempts in prop::collection::vec((0usize..40, any::<bool>()), 0..80),
    ) {
        let mut tracker = ProgressTracker::new(total);
        let mut last = tracker.completion_percentage();
        for (index, completed) in attempts {
            tracker.record_quest_attempt(&QuestId::new(format!("q{}", index % total)), completed);
            let pct = tracker.completion_percentage();
            prop_assert!((0.0..=100.0).contains(&pct));
            prop_assert!(pct >= last);
            last = pct;
        }

        for i in 0..total {
            tracker.record_quest_attempt(&QuestId::new(format!("q{i}")), true);
        }
        prop_assert!((tracker.completion_percentage() - 100.0).abs() < f32::EPSILON);
    }

    #[test]
    fn property_6_boss_pays_at_least_triple(base in 0i64..1_000_000) {
        let boss = RewardSystem::payout(base, Difficulty::Boss);
        let normal = RewardSystem::payout(base, Difficulty::Normal);
        prop_assert!(boss >= 3 * normal);
    }

    #[test]
    fn mark_challenge_completed_is_idempotent(marks in 1usize..10) {
        let mut manager = QuestManager::new(single_quest_catalog());
        let mut player = PlayerProgress::new();
        let rewards = RewardSystem::new();
        let mut dice = ScriptedDice::constant(NO_DROP);

        manager.start_quest("q1", &mut player).expect("start should succeed");
        for _ in 0..marks {
            manager.mark_challenge_completed("q1").expect("mark should succeed");
            prop_assert_eq!(player.currency(), 0);
        }
        prop_assert!(manager.check_completion("q1", &player));
        manager.complete_quest("q1", &mut player, &rewards, &mut dice).expect("complete should succeed");
        prop_assert_eq!(player.currency(), 100);
    }
}
