use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::{
    Json, Router,
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use lifeview_app::{ClientConfig, RestClient, SessionDriver, SimulationApi};
use lifeview_core::{
    Action, ApplicationMode, CellVariant, Command, ExchangeError, Session, SpeedSetting,
};
use serde_json::{Value, json};
use tokio::net::TcpListener;
use tokio::runtime::Handle;

#[derive(Debug, Default)]
struct FakeSimulation {
    running: bool,
    paused: bool,
    food: u32,
    cells: Vec<&'static str>,
    speed: Option<String>,
    report_missing: bool,
    requests: Vec<String>,
}

type Shared = Arc<Mutex<FakeSimulation>>;
type Params = Query<HashMap<String, String>>;

fn log(sim: &mut FakeSimulation, endpoint: &str, params: &HashMap<String, String>) {
    let mut pairs: Vec<_> = params.iter().map(|(k, v)| format!("{k}={v}")).collect();
    pairs.sort();
    if pairs.is_empty() {
        sim.requests.push(endpoint.to_string());
    } else {
        sim.requests.push(format!("{endpoint}?{}", pairs.join("&")));
    }
}

async fn start(State(state): State<Shared>, Query(params): Params) -> StatusCode {
    let mut sim = state.lock().unwrap();
    log(&mut sim, "start", &params);
    sim.running = true;
    sim.paused = false;
    sim.food = params
        .get("initialFood")
        .and_then(|raw| raw.parse().ok())
        .unwrap_or(20);
    StatusCode::OK
}

async fn toggle_pause(State(state): State<Shared>, Query(params): Params) -> StatusCode {
    let mut sim = state.lock().unwrap();
    log(&mut sim, "togglePause", &params);
    sim.paused = !sim.paused;
    StatusCode::OK
}

async fn reset(State(state): State<Shared>, Query(params): Params) -> StatusCode {
    let mut sim = state.lock().unwrap();
    log(&mut sim, "reset", &params);
    sim.running = false;
    sim.paused = false;
    sim.food = 0;
    sim.cells.clear();
    StatusCode::OK
}

async fn add_cell(State(state): State<Shared>, Query(params): Params) -> StatusCode {
    let mut sim = state.lock().unwrap();
    log(&mut sim, "addCell", &params);
    let variant = match params.get("type").map(String::as_str) {
        Some("sexual") => "Sexual",
        _ => "Asexual",
    };
    sim.cells.push(variant);
    StatusCode::OK
}

async fn add_food(State(state): State<Shared>, Query(params): Params) -> StatusCode {
    let mut sim = state.lock().unwrap();
    log(&mut sim, "addFood", &params);
    let grant = (sim.cells.len() as u32 + 5).max(5);
    sim.food += grant;
    StatusCode::OK
}

async fn kill_all(State(state): State<Shared>, Query(params): Params) -> StatusCode {
    let mut sim = state.lock().unwrap();
    log(&mut sim, "killAll", &params);
    sim.cells.clear();
    StatusCode::OK
}

async fn speed(State(state): State<Shared>, Query(params): Params) -> StatusCode {
    let mut sim = state.lock().unwrap();
    log(&mut sim, "speed", &params);
    sim.speed = params.get("action").cloned();
    StatusCode::OK
}

async fn status(State(state): State<Shared>) -> Json<Value> {
    let sim = state.lock().unwrap();
    let cells: Vec<Value> = sim
        .cells
        .iter()
        .enumerate()
        .map(|(id, variant)| {
            json!({
                "id": id,
                "x": 10.0 * id as f64,
                "y": 50.0,
                "type": variant,
                "isHungry": false,
                "isReproducing": false,
            })
        })
        .collect();
    Json(json!({
        "aliveCount": sim.cells.len(),
        "availableFood": sim.food,
        "paused": sim.paused,
        "running": sim.running,
        "food": [{ "x": 25.0, "y": 75.0 }],
        "activeCells": cells,
    }))
}

async fn summary(State(state): State<Shared>, Query(params): Params) -> Response {
    let mut sim = state.lock().unwrap();
    log(&mut sim, "ai/summary", &params);
    if sim.report_missing {
        return (StatusCode::NOT_FOUND, "no finished runs").into_response();
    }
    Json(json!({
        "aiAnalysis": "The colony thrived on steady feeding.",
        "aliveCount": sim.cells.len(),
        "divisions": 8,
        "generations": 2,
        "totalCells": 14,
    }))
    .into_response()
}

async fn spawn_fake() -> (SocketAddr, Shared) {
    let state: Shared = Arc::new(Mutex::new(FakeSimulation::default()));
    let app = Router::new()
        .route("/api/simulation/start", post(start))
        .route("/api/simulation/togglePause", post(toggle_pause))
        .route("/api/simulation/reset", post(reset))
        .route("/api/simulation/addCell", post(add_cell))
        .route("/api/simulation/addFood", post(add_food))
        .route("/api/simulation/killAll", post(kill_all))
        .route("/api/simulation/speed", post(speed))
        .route("/api/simulation/status", get(status))
        .route("/api/simulation/ai/summary", get(summary))
        .with_state(Arc::clone(&state));

    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("local addr");
    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("serve");
    });
    (addr, state)
}

fn config_for(addr: SocketAddr) -> ClientConfig {
    ClientConfig {
        poll_interval_ms: 20,
        request_timeout_ms: Some(2_000),
        ..ClientConfig::with_base_url(format!("http://{addr}"))
    }
}

async fn wait_until<A, F>(driver: &mut SessionDriver<A>, what: &str, mut done: F)
where
    A: SimulationApi,
    F: FnMut(&Session) -> bool,
{
    for _ in 0..300 {
        driver.pump();
        if done(driver.session()) {
            return;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("timed out waiting for {what}");
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn rest_client_speaks_the_simulation_contract() {
    let (addr, state) = spawn_fake().await;
    let config = ClientConfig {
        initial_food: Some(30),
        report_games: Some(3),
        ..config_for(addr)
    };
    let client = RestClient::new(&config).expect("client");

    client.send_command(Command::Start).await.expect("start");
    client
        .send_command(Command::AddCell(CellVariant::Sexual))
        .await
        .expect("add cell");
    client
        .send_command(Command::Speed(SpeedSetting::Fast))
        .await
        .expect("speed");

    let snapshot = client.fetch_status().await.expect("status");
    assert!(snapshot.running);
    assert_eq!(snapshot.available_food, 30);
    assert_eq!(snapshot.alive_count, 1);
    assert_eq!(snapshot.cells[0].variant, CellVariant::Sexual);
    assert_eq!(snapshot.food.len(), 1);

    client.send_command(Command::TogglePause).await.expect("pause");
    assert!(client.fetch_status().await.expect("status").paused);
    client.send_command(Command::TogglePause).await.expect("resume");
    assert!(!client.fetch_status().await.expect("status").paused);

    let summary = client.fetch_report().await.expect("report");
    assert_eq!(summary.divisions, 8);
    assert_eq!(summary.generations, 2);

    let sim = state.lock().unwrap();
    assert_eq!(sim.speed.as_deref(), Some("fast"));
    assert_eq!(
        sim.requests,
        vec![
            "start?initialFood=30",
            "addCell?type=sexual",
            "speed?action=fast",
            "togglePause",
            "togglePause",
            "ai/summary?lastNgames=3",
        ]
    );
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn missing_report_surfaces_status_error() {
    let (addr, state) = spawn_fake().await;
    state.lock().unwrap().report_missing = true;
    let client = RestClient::new(&config_for(addr)).expect("client");

    let err = client.fetch_report().await.expect_err("404");
    assert_eq!(
        err,
        ExchangeError::Status {
            status: 404,
            body: "no finished runs".into(),
        }
    );
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn operator_session_against_live_server() {
    let (addr, state) = spawn_fake().await;
    let api = Arc::new(RestClient::new(&config_for(addr)).expect("client"));
    let mut driver = SessionDriver::new(api, Handle::current(), Duration::from_millis(20));

    driver.perform(Action::Begin).expect("begin");
    wait_until(&mut driver, "running mirror", |s| {
        s.mirror().is_some_and(|m| m.running)
    })
    .await;

    driver
        .perform(Action::Issue(Command::AddCell(CellVariant::Asexual)))
        .expect("add cell");
    wait_until(&mut driver, "one cell", |s| {
        s.mirror().is_some_and(|m| m.alive_count == 1)
    })
    .await;

    let food_before = driver.session().mirror().map(|m| m.available_food).unwrap();
    driver
        .perform(Action::Issue(Command::AddFood))
        .expect("feed");
    assert_eq!(
        driver.session().mirror().map(|m| m.available_food),
        Some(food_before + 6)
    );
    wait_until(&mut driver, "server-side food", |_| {
        state.lock().unwrap().food == food_before + 6
    })
    .await;

    driver
        .perform(Action::Issue(Command::KillAll))
        .expect("kill all");
    driver.perform(Action::Confirm(true)).expect("confirm");
    wait_until(&mut driver, "empty arena", |s| {
        s.mirror().is_some_and(|m| m.alive_count == 0 && m.cells.is_empty())
    })
    .await;
    assert!(state.lock().unwrap().requests.contains(&"killAll".to_string()));

    driver
        .perform(Action::Navigate(ApplicationMode::Report))
        .expect("report");
    assert!(!driver.is_polling());
    wait_until(&mut driver, "report summary", |s| !s.report().loading).await;
    let summary = driver.session().report().summary.clone().expect("summary");
    assert!(!summary.is_unavailable());
    assert_eq!(summary.divisions, 8);
    assert!(driver.session().connectivity().is_reachable());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn report_404_falls_back_to_offline_summary() {
    let (addr, state) = spawn_fake().await;
    state.lock().unwrap().report_missing = true;
    let api = Arc::new(RestClient::new(&config_for(addr)).expect("client"));
    let mut driver = SessionDriver::new(api, Handle::current(), Duration::from_millis(20));

    driver
        .perform(Action::Navigate(ApplicationMode::Report))
        .expect("report");
    wait_until(&mut driver, "report fallback", |s| !s.report().loading).await;

    let summary = driver.session().report().summary.clone().expect("summary");
    assert!(summary.is_unavailable());
    assert_eq!(summary.analysis, lifeview_core::REPORT_UNAVAILABLE);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn unreachable_simulation_flips_connectivity() {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").expect("bind");
    let addr = listener.local_addr().expect("addr");
    drop(listener);

    let api = Arc::new(RestClient::new(&config_for(addr)).expect("client"));
    let mut driver = SessionDriver::new(api, Handle::current(), Duration::from_millis(20));

    driver.perform(Action::Begin).expect("begin");
    wait_until(&mut driver, "no signal", |s| {
        !s.connectivity().is_reachable()
    })
    .await;
    assert!(driver.session().mirror().is_none());
    assert_eq!(driver.session().mode(), ApplicationMode::Running);
}
