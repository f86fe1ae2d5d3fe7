use askama::Template;
use axum::extract::{Extension, Form};
use axum::response::Json;
use axum::routing::{get, post};
use axum::Router;
use clap::Parser;
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tower_http::trace::TraceLayer;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

mod clock;
mod controller;
mod error;
mod models;
mod notification;
mod serve;
mod sink;

use clock::{Clock, SystemClock};
use controller::BookingFormController;
use error::Error;
use models::{Field, FormView, Tower, FLOORS, ROOMS};
use notification::{AutoDismiss, DismissReason, Notice, Notifications};
use sink::{BookingSink, LogSink};

#[derive(Parser, Debug)]
#[command(version, about = "Meeting-room booking form")]
struct Config {
    /// Address to listen on.
    #[arg(long, env = "BOOKING_ADDR", default_value = "0.0.0.0:3000")]
    addr: SocketAddr,
    /// Seconds before a banner closes by itself.
    #[arg(long, env = "BOOKING_NOTIFICATION_TIMEOUT", default_value_t = 5)]
    notification_timeout: u64,
}

struct Session {
    controller: BookingFormController,
    auto_dismiss: AutoDismiss,
}

struct State {
    session: Mutex<Session>,
    clock: Box<dyn Clock>,
    timeout: Duration,
}

impl State {
    fn new(clock: Box<dyn Clock>, sink: Box<dyn BookingSink>, timeout: Duration) -> Self {
        Self {
            session: Mutex::new(Session {
                controller: BookingFormController::new(clock.as_ref(), sink),
                auto_dismiss: AutoDismiss::new(timeout),
            }),
            clock,
            timeout,
        }
    }
}

struct SelectOption {
    value: String,
    label: String,
    selected: bool,
}

impl SelectOption {
    fn new(value: &str, label: &str, current: &str) -> Self {
        Self {
            value: value.to_string(),
            label: label.to_string(),
            selected: value == current,
        }
    }

    fn number(number: u8, current: &str) -> Self {
        let value = number.to_string();
        Self::new(&value, &value, current)
    }
}

#[derive(Template)]
#[template(path = "booking.html")]
struct BookingPage {
    form: FormView,
    towers: Vec<SelectOption>,
    floors: Vec<SelectOption>,
    rooms: Vec<SelectOption>,
    notifications: Notifications,
    success_message: &'static str,
    warning_message: &'static str,
    timeout_secs: u64,
}

impl BookingPage {
    fn render_from(controller: &BookingFormController, timeout: Duration) -> Result<Self, Error> {
        let form = controller.form().view()?;

        let towers = Tower::ALL
            .iter()
            .map(|tower| SelectOption::new(tower.as_str(), tower.label(), &form.tower))
            .collect();
        let floors = FLOORS
            .map(|floor| SelectOption::number(floor, &form.floor))
            .collect();
        let rooms = ROOMS
            .map(|room| SelectOption::number(room, &form.room))
            .collect();

        Ok(Self {
            form,
            towers,
            floors,
            rooms,
            notifications: controller.notifications(),
            success_message: Notice::Success.message(),
            warning_message: Notice::Warning.message(),
            timeout_secs: timeout.as_secs(),
        })
    }
}

#[derive(Serialize)]
struct StateView {
    form: FormView,
    #[serde(flatten)]
    notifications: Notifications,
}

impl StateView {
    fn of(controller: &BookingFormController) -> Result<Self, Error> {
        Ok(Self {
            form: controller.form().view()?,
            notifications: controller.notifications(),
        })
    }
}

#[derive(Deserialize, Debug)]
struct FieldPayload {
    name: String,
    value: String,
}

/// A full form post. Absent inputs leave their field unchanged.
#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
struct SubmitPayload {
    tower: Option<String>,
    floor: Option<String>,
    room: Option<String>,
    date: Option<String>,
    start_time: Option<String>,
    end_time: Option<String>,
    comment: Option<String>,
}

impl SubmitPayload {
    fn changes(&self) -> impl Iterator<Item = (Field, &str)> {
        [
            (Field::Tower, &self.tower),
            (Field::Floor, &self.floor),
            (Field::Room, &self.room),
            (Field::Date, &self.date),
            (Field::StartTime, &self.start_time),
            (Field::EndTime, &self.end_time),
            (Field::Comment, &self.comment),
        ]
        .into_iter()
        .filter_map(|(field, value)| value.as_deref().map(|value| (field, value)))
    }
}

#[derive(Deserialize, Debug)]
struct DismissPayload {
    reason: Option<DismissReason>,
}

async fn index(Extension(state): Extension<Arc<State>>) -> Result<BookingPage, Error> {
    let mut session = state.session.lock().await;
    session.controller.mount(state.clock.as_ref());
    BookingPage::render_from(&session.controller, state.timeout)
}

async fn get_state(Extension(state): Extension<Arc<State>>) -> Result<Json<StateView>, Error> {
    let session = state.session.lock().await;
    Ok(Json(StateView::of(&session.controller)?))
}

async fn set_field(
    Extension(state): Extension<Arc<State>>,
    Form(payload): Form<FieldPayload>,
) -> Result<Json<StateView>, Error> {
    let field: Field = payload.name.parse()?;

    let mut session = state.session.lock().await;
    session.controller.set_field(field, &payload.value)?;

    Ok(Json(StateView::of(&session.controller)?))
}

async fn submit(
    Extension(state): Extension<Arc<State>>,
    Form(payload): Form<SubmitPayload>,
) -> Result<BookingPage, Error> {
    let mut session = state.session.lock().await;
    session.controller.set_fields(payload.changes())?;
    session.controller.submit()?;

    let epoch = session.controller.epoch();
    let expiring = state.clone();
    session.auto_dismiss.arm(async move {
        if expiring.session.lock().await.controller.expire(epoch) {
            debug!(epoch, "banner expired");
        }
    });

    BookingPage::render_from(&session.controller, state.timeout)
}

async fn clear(Extension(state): Extension<Arc<State>>) -> Result<BookingPage, Error> {
    let mut session = state.session.lock().await;
    session.controller.clear();
    BookingPage::render_from(&session.controller, state.timeout)
}

async fn dismiss(
    Extension(state): Extension<Arc<State>>,
    Form(payload): Form<DismissPayload>,
) -> Result<BookingPage, Error> {
    let reason = payload.reason.unwrap_or(DismissReason::Closed);

    let mut session = state.session.lock().await;
    if session.controller.dismiss(reason) {
        session.auto_dismiss.cancel();
    }

    BookingPage::render_from(&session.controller, state.timeout)
}

fn app(state: Arc<State>) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/field", post(set_field))
        .route("/submit", post(submit))
        .route("/clear", post(clear))
        .route("/dismiss", post(dismiss))
        .route("/api/state", get(get_state))
        .route("/static/*path", get(serve::static_data))
        .layer(Extension(state))
        .layer(TraceLayer::new_for_http())
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = Config::parse();
    let state = Arc::new(State::new(
        Box::new(SystemClock),
        Box::new(LogSink),
        Duration::from_secs(config.notification_timeout),
    ));

    info!(addr = %config.addr, "serving booking form");

    axum::Server::bind(&config.addr)
        .serve(app(state).into_make_service())
        .await?;

    Ok(())
}
