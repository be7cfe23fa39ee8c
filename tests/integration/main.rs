use std::sync::{Arc, Mutex};

use anyhow::Result;
use async_trait::async_trait;

use live_rankings::controller::{Controller, RankingEntry};
use live_rankings::server::{
    parse_replay_line, GameString, PlayerInfo, PlayerRef, ReplayServer, ReplayStep, Score, Scores,
    Server,
};
use live_rankings::widget::RankingSink;

/// Remembers every ranking it was asked to display.
#[derive(Default)]
struct RecordingSink {
    displayed: Mutex<Vec<(Option<String>, Vec<RankingEntry>)>>,
}

impl RecordingSink {
    fn count(&self) -> usize {
        self.displayed.lock().unwrap().len()
    }

    fn last_for(&self) -> Option<String> {
        self.displayed.lock().unwrap().last().and_then(|(login, _)| login.clone())
    }
}

#[async_trait]
impl RankingSink for RecordingSink {
    async fn display(
        &self,
        ranking: &[RankingEntry],
        player: Option<&PlayerInfo>,
    ) -> Result<()> {
        let login = player.map(|p| p.login.clone());
        self.displayed.lock().unwrap().push((login, ranking.to_vec()));
        Ok(())
    }
}

/// Fails to display anything.
struct FailingSink;

#[async_trait]
impl RankingSink for FailingSink {
    async fn display(
        &self,
        _ranking: &[RankingEntry],
        _player: Option<&PlayerInfo>,
    ) -> Result<()> {
        Err(anyhow::anyhow!("widget cannot be sent"))
    }
}

struct Setup {
    server: Arc<ReplayServer>,
    sink: Arc<RecordingSink>,
    controller: Controller,
}

async fn setup(mode_script: &str, repartition: Vec<i32>) -> Setup {
    // Enable logging output
    let _ = env_logger::builder().is_test(true).try_init();

    let server = Arc::new(ReplayServer::new(mode_script, repartition));
    let sink = Arc::new(RecordingSink::default());
    let controller = Controller::init(
        server.clone() as Arc<dyn Server>,
        sink.clone() as Arc<dyn RankingSink>,
    )
    .await;
    Setup {
        server,
        sink,
        controller,
    }
}

/// Feed lines of a callback log, the same way the replay binary does.
async fn replay(setup: &Setup, lines: &[String]) -> Result<()> {
    for line in lines {
        match parse_replay_line(line)? {
            Some(ReplayStep::Directive(directive)) => setup.server.apply(directive).await,
            Some(ReplayStep::Callback(callback)) => setup.controller.on_server_event(callback).await,
            None => {}
        }
    }
    Ok(())
}

fn script_callback(name: &str, json: &str) -> String {
    serde_json::json!({
        "name": "ManiaPlanet.ModeScriptCallbackArray",
        "args": [name, [json]],
    })
    .to_string()
}

fn map_start() -> String {
    script_callback(
        "Maniaplanet.StartMap_Start",
        r#"{"count": 1, "time": 0, "restarted": false, "map": {"uid": "uid", "name": "Map"}}"#,
    )
}

fn round_start(count: i32) -> String {
    let json = serde_json::json!({ "count": count, "time": 0 }).to_string();
    script_callback("Maniaplanet.StartRound_Start", &json)
}

fn waypoint(login: &str, race_millis: i32, cp_index: i32, is_finish: bool) -> String {
    let json = serde_json::json!({
        "login": login,
        "racetime": race_millis,
        "laptime": race_millis,
        "curracecheckpoints": (0..=cp_index).map(|i| (i + 1) * 1000).collect::<Vec<_>>(),
        "checkpointinrace": cp_index,
        "checkpointinlap": cp_index,
        "isendrace": is_finish,
        "isendlap": is_finish,
    });
    script_callback("Trackmania.Event.WayPoint", &json.to_string())
}

fn give_up(login: &str) -> String {
    let json = serde_json::json!({ "time": 0, "login": login }).to_string();
    script_callback("Trackmania.Event.GiveUp", &json)
}

fn scores(section: &str, entries: &[(&str, i32, i32)]) -> String {
    let players = entries
        .iter()
        .map(|(login, time, points)| {
            serde_json::json!({
                "login": login,
                "name": format!("$o{}", login),
                "bestracetime": time,
                "mappoints": points,
            })
        })
        .collect::<Vec<_>>();
    let json = serde_json::json!({ "section": section, "players": players });
    script_callback("Trackmania.Scores", &json.to_string())
}

async fn ranking(setup: &Setup) -> Vec<(String, i32)> {
    setup
        .controller
        .live_ranking()
        .snapshot()
        .await
        .into_iter()
        .map(|e| (e.login, e.score))
        .collect()
}

fn expected(entries: &[(&str, i32)]) -> Vec<(String, i32)> {
    entries.iter().map(|(l, s)| (l.to_string(), *s)).collect()
}

#[tokio::test]
async fn time_attack_session() -> Result<()> {
    let setup = setup("Trackmania/TM_TimeAttack_Online.Script.txt", vec![]).await;
    let initial_displays = setup.sink.count();

    replay(
        &setup,
        &[
            map_start(),
            r#"{"set_nick_name": {"login": "p1", "nick_name": "$f00One"}}"#.to_string(),
            waypoint("p1", 50000, 3, true),
            waypoint("p2", 48000, 3, true),
            waypoint("p1", 47000, 3, true),
            waypoint("p2", 49000, 3, true),
        ],
    )
    .await?;

    assert_eq!(expected(&[("p1", 47000), ("p2", 48000)]), ranking(&setup).await);

    let snapshot = setup.controller.live_ranking().snapshot().await;
    assert_eq!("One", snapshot[0].nick_name.plain());
    assert_eq!("p2", snapshot[1].nick_name.plain());

    // map start, and three improvements; the slower run of p2 is not displayed
    assert_eq!(initial_displays + 4, setup.sink.count());
    Ok(())
}

#[tokio::test]
async fn rounds_session() -> Result<()> {
    let setup = setup("Trackmania/TM_Rounds_Online.Script.txt", vec![10, 6, 4]).await;

    replay(
        &setup,
        &[
            map_start(),
            round_start(1),
            waypoint("p1", 30000, 3, true),
            waypoint("p2", 31000, 3, true),
            waypoint("p3", 32000, 3, true),
            waypoint("p4", 33000, 3, true),
        ],
    )
    .await?;

    // points are only added to the scores at the end of the round
    assert_eq!(
        expected(&[("p1", 0), ("p2", 0), ("p3", 0), ("p4", 0)]),
        ranking(&setup).await
    );

    // the fourth finisher gets the points of the last position
    let added = setup
        .controller
        .live_ranking()
        .snapshot()
        .await
        .into_iter()
        .map(|e| e.points_added)
        .collect::<Vec<_>>();
    assert_eq!(vec![Some(10), Some(6), Some(4), Some(4)], added);

    let live_ranking = setup.controller.live_ranking();
    assert_eq!(Some(4), live_ranking.rank_of("p4").await);
    assert_eq!(None, live_ranking.rank_of("p5").await);
    assert_eq!(4, live_ranking.finishes().await.len());

    // points of the round are not yet included in every score
    replay(&setup, &[scores("PreEndRound", &[("p1", 30000, 0)])]).await?;
    assert_eq!(4, ranking(&setup).await.len());

    replay(
        &setup,
        &[
            scores(
                "EndRound",
                &[("p1", 30000, 10), ("p2", 31000, 6), ("p3", 32000, 4), ("p4", 33000, 4), ("p5", -1, -1)],
            ),
            round_start(2),
            waypoint("p4", 29000, 3, true),
        ],
    )
    .await?;

    // a new round starts counting finishes from the first position,
    // and added points break ties
    assert_eq!(
        expected(&[("p1", 10), ("p2", 6), ("p4", 4), ("p3", 4)]),
        ranking(&setup).await
    );
    let snapshot = setup.controller.live_ranking().snapshot().await;
    assert_eq!(Some(10), snapshot[2].points_added);
    assert_eq!(1, setup.controller.live_ranking().finishes().await.len());
    Ok(())
}

#[tokio::test]
async fn laps_session() -> Result<()> {
    let setup = setup("Trackmania/TM_Laps_Online.Script.txt", vec![]).await;

    replay(
        &setup,
        &[
            map_start(),
            waypoint("p1", 10000, 0, false),
            waypoint("p2", 11000, 0, false),
            waypoint("p1", 20000, 1, false),
            waypoint("p3", 9000, 0, false),
            give_up("p2"),
        ],
    )
    .await?;

    assert_eq!(
        expected(&[("p1", 20000), ("p3", 9000), ("p2", 11000)]),
        ranking(&setup).await
    );

    let snapshot = setup.controller.live_ranking().snapshot().await;
    assert_eq!(Some(2), snapshot[0].checkpoint_count);
    assert!(snapshot[2].gave_up);

    // scores do not affect the ranking in this mode
    replay(&setup, &[scores("EndRound", &[("p4", 5000, 0)])]).await?;
    assert_eq!(3, ranking(&setup).await.len());
    Ok(())
}

#[tokio::test]
async fn mode_switch_between_maps() -> Result<()> {
    let setup = setup("Trackmania/TM_TimeAttack_Online.Script.txt", vec![]).await;

    replay(
        &setup,
        &[
            map_start(),
            waypoint("p1", 50000, 3, true),
            r#"{"set_mode": "Trackmania/TM_Cup_Online.Script.txt"}"#.to_string(),
            r#"{"set_points_repartition": [25, 20]}"#.to_string(),
            map_start(),
            round_start(1),
            waypoint("p2", 40000, 3, true),
        ],
    )
    .await?;

    assert_eq!(expected(&[("p2", 0)]), ranking(&setup).await);
    let snapshot = setup.controller.live_ranking().snapshot().await;
    assert_eq!(Some(25), snapshot[0].points_added);
    Ok(())
}

#[tokio::test]
async fn unsupported_mode_stays_dormant() -> Result<()> {
    let setup = setup("Trackmania/TM_Knockout_Online.Script.txt", vec![]).await;

    replay(
        &setup,
        &[
            map_start(),
            waypoint("p1", 50000, 3, true),
            scores("EndRound", &[("p1", 50000, 0)]),
        ],
    )
    .await?;

    assert!(ranking(&setup).await.is_empty());
    Ok(())
}

#[tokio::test]
async fn init_with_scores_of_running_map() -> Result<()> {
    let _ = env_logger::builder().is_test(true).try_init();

    let server = Arc::new(ReplayServer::new(
        "Trackmania/TM_TimeAttack_Online.Script.txt",
        vec![],
    ));
    let line = r#"{"set_scores": {"section": "", "players": [
        {"login": "p2", "name": "Two", "bestracetime": 42000, "mappoints": 0},
        {"login": "p1", "name": "One", "bestracetime": 41000, "mappoints": 0},
        {"login": "p3", "name": "Three", "bestracetime": -1, "mappoints": 0}
    ]}}"#
        .replace('\n', "");
    match parse_replay_line(&line)? {
        Some(ReplayStep::Directive(directive)) => server.apply(directive).await,
        other => panic!("unexpected step {:?}", other),
    }

    let sink = Arc::new(RecordingSink::default());
    let controller = Controller::init(
        server.clone() as Arc<dyn Server>,
        sink.clone() as Arc<dyn RankingSink>,
    )
    .await;

    let logins = controller
        .live_ranking()
        .snapshot()
        .await
        .into_iter()
        .map(|e| e.login)
        .collect::<Vec<_>>();
    assert_eq!(vec!["p1".to_string(), "p2".to_string()], logins);
    Ok(())
}

#[tokio::test]
async fn display_for_connecting_player() -> Result<()> {
    let setup = setup("Trackmania/TM_TimeAttack_Online.Script.txt", vec![]).await;

    replay(
        &setup,
        &[r#"{"name": "ManiaPlanet.PlayerConnect", "args": ["p9", false]}"#.to_string()],
    )
    .await?;

    assert_eq!(Some("p9".to_string()), setup.sink.last_for());
    Ok(())
}

#[tokio::test]
async fn mode_unavailable_is_unsupported() -> Result<()> {
    let setup = setup("Trackmania/TM_TimeAttack_Online.Script.txt", vec![]).await;
    replay(&setup, &[map_start()]).await?;

    setup.server.clear_mode().await;
    let displays = setup.sink.count();
    replay(&setup, &[waypoint("p1", 50000, 3, true)]).await?;

    assert!(ranking(&setup).await.is_empty());
    assert_eq!(displays, setup.sink.count());

    setup
        .server
        .set_mode("Trackmania/TM_TimeAttack_Online.Script.txt")
        .await;
    replay(&setup, &[waypoint("p1", 50000, 3, true)]).await?;

    assert_eq!(expected(&[("p1", 50000)]), ranking(&setup).await);
    assert_eq!(displays + 1, setup.sink.count());
    Ok(())
}

#[tokio::test]
async fn sink_errors_do_not_affect_ranking() -> Result<()> {
    let _ = env_logger::builder().is_test(true).try_init();

    let server = Arc::new(ReplayServer::new(
        "Trackmania/TM_TimeAttack_Online.Script.txt",
        vec![],
    ));
    let controller = Controller::init(
        server.clone() as Arc<dyn Server>,
        Arc::new(FailingSink) as Arc<dyn RankingSink>,
    )
    .await;

    let lines = [map_start(), waypoint("p1", 50000, 3, true), waypoint("p2", 45000, 3, true)];
    for line in lines.iter() {
        if let Some(ReplayStep::Callback(callback)) = parse_replay_line(line)? {
            controller.on_server_event(callback).await;
        }
    }

    let logins = controller
        .live_ranking()
        .snapshot()
        .await
        .into_iter()
        .map(|e| (e.login, e.score))
        .collect::<Vec<_>>();
    assert_eq!(expected(&[("p2", 45000), ("p1", 50000)]), logins);
    Ok(())
}

#[tokio::test]
async fn init_with_signal_scores() -> Result<()> {
    let _ = env_logger::builder().is_test(true).try_init();

    let signal = |login: &str, points: i32| Score::Signal {
        player: PlayerRef {
            login: login.to_string(),
            nickname: GameString::from(format!("$i{}", login)),
        },
        best_race_time: -1,
        map_points: points,
    };

    let server = Arc::new(ReplayServer::new(
        "Trackmania/TM_Teams_Online.Script.txt",
        vec![10, 6],
    ));
    server
        .set_scores(Scores {
            response_id: String::new(),
            section: "EndRound".to_string(),
            entries: vec![signal("p1", 4), signal("p2", 12), signal("p3", -1)],
        })
        .await;

    let sink = Arc::new(RecordingSink::default());
    let controller = Controller::init(
        server.clone() as Arc<dyn Server>,
        sink.clone() as Arc<dyn RankingSink>,
    )
    .await;

    let snapshot = controller.live_ranking().snapshot().await;
    let logins = snapshot
        .iter()
        .map(|e| (e.login.clone(), e.score))
        .collect::<Vec<_>>();
    assert_eq!(expected(&[("p2", 12), ("p1", 4)]), logins);
    assert_eq!("p2", snapshot[0].nick_name.plain());
    Ok(())
}
