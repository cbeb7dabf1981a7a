//! Action resolution against fixture scenarios.

use redblue_core::{resolve, Action, ActionContext, Intent, Outcome, Resolution, StateChange};
use redblue_state::{RandomStream, StateStore};
use redblue_test_helpers::{fixtures, ids};
use redblue_types::{NodeId, NodeStatus, Team};
use serde_json::json;
use std::time::Duration;

/// First seed whose first draw satisfies `pred`.
fn seed_where(pred: impl Fn(f64) -> bool) -> u64 {
    (0..10_000)
        .find(|seed| pred(RandomStream::new(*seed).next_float()))
        .expect("some seed satisfies the predicate")
}

fn run(intent: &Intent, state: &mut StateStore, rng: &mut RandomStream) -> Resolution {
    let action = intent.action().expect("perform intent");
    let ctx = ActionContext::from_intent(intent.time, intent);
    resolve(action, &ctx, state, rng).expect("resolution does not fault")
}

fn exploit_web_server() -> Intent {
    Intent::perform(Duration::from_secs(1), ids::RED, Action::exploit("V1")).targeting("WebServer")
}

/// First value drawn from a stream seeded with 42.
const SEED_42_FIRST_DRAW: f64 = 0.6818961923066714;

#[test]
fn seed_42_exploit_matches_reference_draw() {
    let mut state = fixtures::load(&fixtures::web_server_scenario());
    let mut rng = RandomStream::new(42);

    let resolution = run(&exploit_web_server(), &mut state, &mut rng);

    let p = resolution.probability.unwrap();
    assert!((p - 0.925).abs() < 1e-9);
    assert_eq!(resolution.draw, Some(SEED_42_FIRST_DRAW));
    assert_eq!(rng.draws(), 1);

    assert_eq!(resolution.outcome, Outcome::Success);
    let node = state.get_node(&NodeId::from("WebServer")).unwrap();
    assert_eq!(node.status(), NodeStatus::CompromisedCovert);
    assert_eq!(node.compromising_actor(), Some(&ids::red()));
}

#[test]
fn successful_exploit_compromises_and_schedules_decision() {
    let mut state = fixtures::load(&fixtures::web_server_scenario());
    let mut rng = RandomStream::new(seed_where(|d| d < 0.5));

    let resolution = run(&exploit_web_server(), &mut state, &mut rng);

    assert_eq!(resolution.outcome, Outcome::Success);
    assert!(state.actor_knows(&ids::red(), &NodeId::from("WebServer")));
    assert_eq!(state.action_points(&ids::red()), Some(7));
    assert_eq!(resolution.intents.len(), 1);
    assert_eq!(resolution.intents[0].time, Duration::from_secs(4));
    assert_eq!(resolution.intents[0].label(), "Decide");
    assert!(resolution.changes.iter().any(|c| matches!(
        c,
        StateChange::NodeStatus { to: NodeStatus::CompromisedCovert, .. }
    )));
}

#[test]
fn failed_exploit_still_costs_action_points() {
    let mut state = fixtures::load(&fixtures::web_server_scenario());
    let mut rng = RandomStream::new(seed_where(|d| d > 0.95));

    let resolution = run(&exploit_web_server(), &mut state, &mut rng);

    assert_eq!(resolution.outcome, Outcome::Failure);
    assert!(!resolution.logs.is_empty());
    assert!(resolution.intents.is_empty());
    assert_eq!(state.action_points(&ids::red()), Some(7));
    assert!(state
        .get_node(&NodeId::from("WebServer"))
        .unwrap()
        .is_operational());
}

#[test]
fn unmet_prerequisites_draw_nothing_and_mutate_nothing() {
    let cases = vec![
        // Vulnerability not present on the target.
        Intent::perform(Duration::from_secs(1), ids::RED, Action::exploit(ids::SQLI)).targeting(ids::DB),
        // No red-traversable edge Internet -> DB.
        Intent::perform(Duration::from_secs(1), ids::RED, Action::exploit(ids::SSH_WEAK))
            .targeting(ids::DB)
            .from_node(ids::INTERNET),
        // Missing target.
        Intent::perform(Duration::from_secs(1), ids::RED, Action::scan()),
        // Unknown target.
        Intent::perform(Duration::from_secs(1), ids::RED, Action::scan()).targeting("Ghost"),
        // Wrong team.
        Intent::perform(Duration::from_secs(1), ids::RED, Action::isolate()).targeting(ids::WEB),
        // Unknown actor.
        Intent::perform(Duration::from_secs(1), "Nobody", Action::scan()).targeting(ids::WEB),
        // Exploiting the internet itself.
        Intent::perform(Duration::from_secs(1), ids::RED, Action::exploit(ids::SQLI)).targeting(ids::INTERNET),
        // Blocked source address.
        Intent::perform(Duration::from_secs(1), ids::RED, Action::exploit(ids::SQLI))
            .targeting(ids::WEB)
            .from_node(ids::INTERNET)
            .with_payload(json!({ "source_ip": "5.6.7.8" })),
    ];

    for intent in cases {
        let mut state = fixtures::load(&fixtures::network_scenario());
        state.block_ip("5.6.7.8");
        let before = state.clone();
        let mut rng = RandomStream::new(42);

        let resolution = run(&intent, &mut state, &mut rng);

        assert_eq!(resolution.outcome, Outcome::PrerequisitesUnmet, "{}", intent.label());
        assert_eq!(rng.draws(), 0);
        assert_eq!(resolution.probability, None);
        assert_eq!(resolution.logs.len(), 1);
        assert!(resolution.logs[0].message.contains("prerequisites not met"));
        assert!(resolution.changes.is_empty());
        assert_eq!(
            serde_json::to_value(&state).unwrap(),
            serde_json::to_value(&before).unwrap()
        );
    }
}

#[test]
fn insufficient_action_points_is_a_prerequisite_failure() {
    let mut state = fixtures::load(&fixtures::network_scenario());
    state.reset_action_points(&ids::blue(), 3).unwrap();
    let mut rng = RandomStream::new(42);

    let intent = Intent::perform(Duration::from_secs(8), ids::BLUE, Action::isolate()).targeting(ids::WEB);
    let resolution = run(&intent, &mut state, &mut rng);

    assert_eq!(resolution.outcome, Outcome::PrerequisitesUnmet);
    assert_eq!(state.action_points(&ids::blue()), Some(3));
    assert_eq!(rng.draws(), 0);
}

#[test]
fn exploit_over_red_edge_from_internet() {
    let mut state = fixtures::load(&fixtures::network_scenario());
    let mut rng = RandomStream::new(seed_where(|d| d < 0.5));

    let intent = Intent::perform(Duration::from_secs(1), ids::RED, Action::exploit(ids::SQLI))
        .targeting(ids::WEB)
        .from_node(ids::INTERNET);
    let resolution = run(&intent, &mut state, &mut rng);

    assert_eq!(resolution.outcome, Outcome::Success);
    assert_eq!(
        state.get_node(&ids::web()).unwrap().status(),
        NodeStatus::CompromisedCovert
    );
}

#[test]
fn scan_reveals_target_and_red_neighbours() {
    let mut state = fixtures::load(&fixtures::network_scenario());
    let mut rng = RandomStream::new(seed_where(|d| d < 0.3));

    let intent = Intent::perform(Duration::from_secs(4), ids::RED, Action::scan()).targeting(ids::WEB);
    let resolution = run(&intent, &mut state, &mut rng);

    assert_eq!(resolution.outcome, Outcome::Success);
    assert!(state.actor_knows(&ids::red(), &ids::web()));
    assert!(state.actor_knows(&ids::red(), &ids::db()));
    assert!(!state.actor_knows(&ids::red(), &ids::blue_ws()));
    assert_eq!(state.action_points(&ids::red()), Some(8));

    let details = &resolution.logs.last().unwrap().details;
    assert_eq!(details["vulnerabilities"], json!([ids::SQLI]));
}

#[test]
fn scan_accepts_compromised_targets_but_not_isolated_ones() {
    let mut state = fixtures::load(&fixtures::network_scenario());
    state
        .update_node(&ids::web(), redblue_state::NodeUpdate::Compromise { by: ids::red() })
        .unwrap();
    let mut rng = RandomStream::new(seed_where(|d| d < 0.3));
    let intent = Intent::perform(Duration::from_secs(4), ids::RED, Action::scan()).targeting(ids::WEB);

    let compromised = run(&intent, &mut state, &mut rng);
    assert_eq!(compromised.outcome, Outcome::Success);
    assert_eq!(rng.draws(), 1);

    state.update_node(&ids::web(), redblue_state::NodeUpdate::Isolate).unwrap();
    let isolated = run(&intent, &mut state, &mut rng);
    assert_eq!(isolated.outcome, Outcome::PrerequisitesUnmet);
    assert_eq!(rng.draws(), 1);
}

#[test]
fn block_ip_twice_leaves_one_entry() {
    let mut state = fixtures::load(&fixtures::network_scenario());
    let mut rng = RandomStream::new(seed_where(|d| d < 0.5));
    let intent = Intent::perform(Duration::from_secs(5), ids::BLUE, Action::block_ip("5.6.7.8"));

    let first = run(&intent, &mut state, &mut rng);
    assert_eq!(first.outcome, Outcome::Success);
    assert!(state.is_blocked("5.6.7.8"));

    let mut rng = RandomStream::new(seed_where(|d| d < 0.5));
    let second = run(&intent, &mut state, &mut rng);
    assert_eq!(second.outcome, Outcome::Success);
    assert!(second.logs.iter().any(|l| l.message.contains("already blocked")));
    assert!(!second.changes.iter().any(|c| matches!(c, StateChange::IpBlocked { .. })));
    assert_eq!(state.blocked_ips().count(), 1);
}

#[test]
fn isolation_clears_compromise_and_closes_red_edges() {
    let mut state = fixtures::load(&fixtures::network_scenario());
    state
        .update_node(
            &ids::web(),
            redblue_state::NodeUpdate::Compromise { by: ids::red() },
        )
        .unwrap();
    let mut rng = RandomStream::new(seed_where(|d| d < 0.5));

    let intent = Intent::perform(Duration::from_secs(8), ids::BLUE, Action::isolate()).targeting(ids::WEB);
    let resolution = run(&intent, &mut state, &mut rng);

    assert_eq!(resolution.outcome, Outcome::Success);
    let web = state.get_node(&ids::web()).unwrap();
    assert_eq!(web.status(), NodeStatus::Isolated);
    assert!(web.compromising_actor().is_none());
    assert!(!state.is_connected(&ids::internet(), &ids::web(), Team::Red));
    assert!(!state.is_connected(&ids::web(), &ids::db(), Team::Red));
    assert!(state.is_connected(&ids::blue_ws(), &ids::web(), Team::Blue));
    assert_eq!(state.action_points(&ids::blue()), Some(6));

    // Already isolated.
    let again = run(&intent, &mut state, &mut rng);
    assert_eq!(again.outcome, Outcome::PrerequisitesUnmet);
}

#[test]
fn patch_removes_vulnerability() {
    let mut state = fixtures::load(&fixtures::network_scenario());
    let mut rng = RandomStream::new(seed_where(|d| d < 0.3));

    let intent = Intent::perform(Duration::from_secs(6), ids::BLUE, Action::patch(ids::SQLI)).targeting(ids::WEB);
    let resolution = run(&intent, &mut state, &mut rng);

    // 0.85 + (5.5 - 7) / 10
    assert!((resolution.probability.unwrap() - 0.7).abs() < 1e-9);
    assert_eq!(resolution.outcome, Outcome::Success);
    assert!(!state.get_node(&ids::web()).unwrap().has_vulnerability(&ids::sqli()));
}
