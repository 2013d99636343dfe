//! App state and main loop: input handling, pumping the update channel,
//! task-list requests, and drawing.

use std::{
    io,
    time::{Duration, Instant},
};

use crossterm::{
    event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout},
    Terminal,
};
use tokio::{
    sync::mpsc::{unbounded_channel, UnboundedReceiver, UnboundedSender},
    time::sleep,
};
use tracing::{info, warn};

use crate::client::LiveUpdateClient;
use crate::dashboard::Dashboard;
use crate::form::{parse_command, RequestOutcome, TaskBoard};
use crate::profiles::DisplaySettings;
use crate::tasks::{TaskApi, TaskError, TaskList, TaskRequest};
use crate::transport::{build_http_client, HttpTransport, Transport};
use crate::ui::{
    feed::draw_feed, form::draw_form, header::draw_header, metrics::draw_metrics,
    tasks::draw_tasks,
};

type TaskResult = Result<(u16, TaskList), TaskError>;

pub struct App {
    server: String,
    pub dashboard: Dashboard,
    pub board: TaskBoard,
    should_quit: bool,
    results_tx: UnboundedSender<(TaskRequest, TaskResult)>,
    results_rx: UnboundedReceiver<(TaskRequest, TaskResult)>,
    tick: Duration,
}

impl App {
    pub fn new(server: &str, display: &DisplaySettings) -> Self {
        let (results_tx, results_rx) = unbounded_channel();
        Self {
            server: server.to_string(),
            dashboard: Dashboard::new(display.panels).with_time_format(&display.time_format),
            board: TaskBoard::default(),
            should_quit: false,
            results_tx,
            results_rx,
            tick: Duration::from_millis(50),
        }
    }

    pub fn should_quit(&self) -> bool {
        self.should_quit
    }

    pub async fn run(&mut self, tls_ca: Option<&str>) -> anyhow::Result<()> {
        let http = build_http_client(tls_ca)?;
        let transport = HttpTransport::new(http.clone(), &self.server)?;
        let api = TaskApi::new(http, &self.server)?;
        info!(url = %transport.url(), "starting");

        let mut client = LiveUpdateClient::new(transport);
        client.start();
        self.request(&api, TaskRequest::Refresh);

        // Terminal setup
        enable_raw_mode()?;
        let mut stdout = io::stdout();
        execute!(stdout, EnterAlternateScreen)?;
        let backend = CrosstermBackend::new(stdout);
        let mut terminal = Terminal::new(backend)?;
        terminal.clear()?;

        // Main loop
        let res = self.event_loop(&mut terminal, &mut client, &api).await;

        client.stop();

        // Teardown
        disable_raw_mode()?;
        execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
        terminal.show_cursor()?;

        res
    }

    async fn event_loop<B: ratatui::backend::Backend, T: Transport>(
        &mut self,
        terminal: &mut Terminal<B>,
        client: &mut LiveUpdateClient<T>,
        api: &TaskApi,
    ) -> anyhow::Result<()> {
        loop {
            // Input (non-blocking)
            while event::poll(Duration::from_millis(10))? {
                if let Event::Key(k) = event::read()? {
                    if let Some(req) = self.on_key(k) {
                        self.request(api, req);
                    }
                }
            }
            if self.should_quit {
                break;
            }

            client.pump(&mut self.dashboard);
            while let Ok((req, result)) = self.results_rx.try_recv() {
                self.complete_request(&req, result, Instant::now());
            }

            terminal.draw(|f| self.draw(f))?;
            sleep(self.tick).await;
        }
        Ok(())
    }

    /// Map a key press to an edit, a quit, or a task request to send.
    pub fn on_key(&mut self, k: KeyEvent) -> Option<TaskRequest> {
        if k.kind == KeyEventKind::Release {
            return None;
        }
        let ctrl = k.modifiers.contains(KeyModifiers::CONTROL);
        match k.code {
            KeyCode::Esc => self.should_quit = true,
            KeyCode::Char('c') if ctrl => self.should_quit = true,
            KeyCode::Char('r') if ctrl => return Some(TaskRequest::Refresh),
            KeyCode::Enter => {
                let req = parse_command(&self.board.input)?;
                // a disabled button cannot submit twice
                if req.from_form() && self.board.button.is_disabled() {
                    return None;
                }
                if !req.from_form() {
                    self.board.input.clear();
                }
                return Some(req);
            }
            KeyCode::Backspace => {
                self.board.input.pop();
            }
            KeyCode::Char(c) if !ctrl => self.board.input.push(c),
            _ => {}
        }
        None
    }

    fn request(&mut self, api: &TaskApi, req: TaskRequest) {
        // plain refreshes bypass the button lifecycle
        if req != TaskRequest::Refresh {
            self.board.before_request(&req);
        }
        let api = api.clone();
        let tx = self.results_tx.clone();
        tokio::spawn(async move {
            let result = api.send(&req).await;
            let _ = tx.send((req, result));
        });
    }

    pub fn complete_request(&mut self, req: &TaskRequest, result: TaskResult, now: Instant) {
        let outcome = match &result {
            Ok((status, _)) => RequestOutcome {
                successful: true,
                status: Some(*status),
            },
            Err(e) => {
                warn!(?req, "task request failed: {e}");
                RequestOutcome {
                    successful: false,
                    status: e.status(),
                }
            }
        };
        if *req != TaskRequest::Refresh {
            self.board.after_request(req, outcome);
        }
        if let Ok((_, list)) = result {
            self.board.swap(list, now);
        }
    }

    pub fn draw(&self, f: &mut ratatui::Frame<'_>) {
        let area = f.area();
        let now = Instant::now();

        // Root rows: header, body
        let rows = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(2), Constraint::Min(6)])
            .split(area);
        draw_header(f, rows[0], &self.server, self.dashboard.status.as_ref());

        // Body: tasks + form (left), metrics + activity (right)
        let cols = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(60), Constraint::Percentage(40)])
            .split(rows[1]);

        let left = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Min(3), Constraint::Length(3)])
            .split(cols[0]);
        draw_tasks(f, left[0], &self.board, self.board.is_highlighted(now));
        draw_form(f, left[1], &self.board);

        match (&self.dashboard.metrics, &self.dashboard.feed) {
            (Some(m), Some(feed)) => {
                let right = Layout::default()
                    .direction(Direction::Vertical)
                    .constraints([Constraint::Length(4), Constraint::Min(3)])
                    .split(cols[1]);
                draw_metrics(f, right[0], m);
                draw_feed(f, right[1], feed);
            }
            (Some(m), None) => draw_metrics(f, cols[1], m),
            (None, Some(feed)) => draw_feed(f, cols[1], feed),
            (None, None) => {}
        }
    }
}
