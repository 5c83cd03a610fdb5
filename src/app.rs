use eframe::egui;
use std::path::PathBuf;
use std::sync::mpsc::{self, Receiver};
use std::sync::Mutex;
use std::time::Duration;

use crate::config::{AppConfig, CONFIG_PATH};
use crate::quiz::{OptionLabel, QuestionStore};
use crate::report::{ResultRow, ResultsLog, ScoreReport};
use crate::session::QuizSession;
use crate::timer::{CountdownTimer, TimerEvent};
use crate::ui::{QuizAction, QuizUI};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum AppState {
    NameEntry,
    QuizInProgress,
    QuizResults,
}

pub struct QuizApp {
    config: AppConfig,
    config_path: PathBuf,
    ui: QuizUI,
    store: QuestionStore,
    session: Option<QuizSession>,
    report: Option<ScoreReport>,
    chart_path: Option<PathBuf>,
    save_errors: Vec<String>,
    history: Vec<ResultRow>,
    timer: CountdownTimer,
    timer_events: Receiver<TimerEvent>,
    state: AppState,
}

impl QuizApp {
    pub fn new(cc: &eframe::CreationContext<'_>, config: AppConfig) -> Self {
        cc.egui_ctx.set_visuals(if config.dark_mode {
            egui::Visuals::dark()
        } else {
            egui::Visuals::light()
        });
        Self::with_context(cc.egui_ctx.clone(), config, PathBuf::from(CONFIG_PATH))
    }

    fn with_context(ctx: egui::Context, config: AppConfig, config_path: PathBuf) -> Self {
        let (tx, timer_events) = mpsc::channel();
        let tx = Mutex::new(tx);
        let timer = CountdownTimer::new(move || {
            if let Ok(tx) = tx.lock() {
                let _ = tx.send(TimerEvent::Expired);
            }
            ctx.request_repaint();
        });

        let store = Self::load_store(&config);

        Self {
            config,
            config_path,
            ui: QuizUI::default(),
            store,
            session: None,
            report: None,
            chart_path: None,
            save_errors: Vec::new(),
            history: Vec::new(),
            timer,
            timer_events,
            state: AppState::NameEntry,
        }
    }

    fn load_store(config: &AppConfig) -> QuestionStore {
        let mut store = QuestionStore::load_or_empty(&config.questions_file);
        if config.shuffle_questions {
            store.shuffle();
        }
        store
    }

    fn choose_questions_file(&mut self) {
        let mut dialog = rfd::FileDialog::new().add_filter("CSV", &["csv"]);
        if let Some(dir) = self.config.questions_file.parent() {
            dialog = dialog.set_directory(dir);
        }
        let Some(path) = dialog.pick_file() else {
            return;
        };

        log::info!("Selected questions file: {}", path.display());
        self.config.questions_file = path;
        self.store = Self::load_store(&self.config);
        self.save_config();
    }

    fn start_quiz(&mut self, user_name: String) {
        log::info!("Starting quiz for {} with {} questions", user_name, self.store.len());
        self.session = Some(QuizSession::new(user_name, self.store.shared()));
        self.report = None;
        self.chart_path = None;
        self.save_errors.clear();

        self.timer.reset(self.config.duration_secs());
        self.timer.start(self.config.duration_secs());
        self.state = AppState::QuizInProgress;
    }

    fn submit_quiz(&mut self) {
        let Some(session) = &self.session else {
            return;
        };
        self.timer.stop();

        let tally = session.submit(self.timer.elapsed_secs());
        let report = ScoreReport::from_tally(session.user_name(), tally);

        self.save_errors.clear();
        let results = ResultsLog::new(self.config.results_file());
        if let Err(e) = report.persist(&results) {
            log::error!("Failed to save results to {}: {}", results.path().display(), e);
            self.save_errors.push(format!("Could not save results: {}", e));
        }
        self.history = match results.rows() {
            Ok(rows) => rows
                .into_iter()
                .filter(|row| row.user_name == report.user_name())
                .collect(),
            Err(e) => {
                log::warn!("Could not read results log: {}", e);
                Vec::new()
            }
        };

        self.chart_path = match report.render_chart(&self.config.results_dir) {
            Ok(path) => Some(path),
            Err(e) => {
                log::error!("Failed to write chart: {}", e);
                self.save_errors.push(format!("Could not generate chart: {}", e));
                None
            }
        };

        self.config.update_recent_users(report.user_name().to_string());
        self.save_config();

        self.report = Some(report);
        self.state = AppState::QuizResults;
    }

    fn take_again(&mut self) {
        self.timer.reset(self.config.duration_secs());
        self.session = None;
        self.report = None;
        self.chart_path = None;
        self.save_errors.clear();
        self.history.clear();
        self.ui.reset();
        if self.config.shuffle_questions {
            self.store.shuffle();
        }
        self.state = AppState::NameEntry;
    }

    fn save_config(&self) {
        if let Err(e) = self.config.save_to(&self.config_path) {
            log::warn!("Failed to save config: {}", e);
        }
    }

    fn drain_timer_events(&mut self) {
        while let Ok(event) = self.timer_events.try_recv() {
            self.on_timer_event(event);
        }
    }

    fn handle_answer(&mut self, option: OptionLabel) {
        if let Some(session) = &mut self.session {
            let index = session.current_index();
            session.answer(index, option);
        }
    }

    /// Submits on expiry; an expiry arriving outside a running quiz is dropped.
    fn on_timer_event(&mut self, event: TimerEvent) {
        match event {
            TimerEvent::Expired if self.state == AppState::QuizInProgress => {
                log::info!("Time is up, submitting automatically");
                self.submit_quiz();
            }
            TimerEvent::Expired => {
                log::debug!("Ignoring timer expiry in state {:?}", self.state);
            }
        }
    }

    fn handle_action(&mut self, action: QuizAction, frame: &mut eframe::Frame) {
        match action {
            QuizAction::None => {}
            QuizAction::StartQuiz(name) => self.start_quiz(name),
            QuizAction::ChooseQuestionsFile => self.choose_questions_file(),
            QuizAction::Answer(option) => self.handle_answer(option),
            QuizAction::PreviousQuestion => {
                if let Some(session) = &mut self.session {
                    session.retreat();
                }
            }
            QuizAction::NextQuestion => {
                if let Some(session) = &mut self.session {
                    session.advance();
                }
            }
            QuizAction::SubmitQuiz => self.submit_quiz(),
            QuizAction::ViewChart => self.ui.open_chart(self.chart_path.as_deref()),
            QuizAction::TakeAgain => self.take_again(),
            QuizAction::Exit => frame.close(),
        }
    }
}

impl eframe::App for QuizApp {
    fn update(&mut self, ctx: &egui::Context, frame: &mut eframe::Frame) {
        self.drain_timer_events();

        let action = egui::CentralPanel::default()
            .show(ctx, |ui| match self.state {
                AppState::NameEntry => self.ui.show_name_entry(
                    ui,
                    &self.config.questions_file,
                    self.store.len(),
                    self.config.duration_minutes,
                    &self.config.recent_users,
                ),
                AppState::QuizInProgress => match &self.session {
                    Some(session) => self.ui.show_question(ui, session, &self.timer.remaining()),
                    None => QuizAction::None,
                },
                AppState::QuizResults => match &self.report {
                    Some(report) => self.ui.show_results(ui, report, &self.history, &self.save_errors),
                    None => QuizAction::None,
                },
            })
            .inner;

        if self.state == AppState::QuizResults {
            if let Some(session) = &self.session {
                let mut open = self.ui.show_review;
                egui::Window::new("Questions Review")
                    .open(&mut open)
                    .default_size(egui::vec2(700.0, 500.0))
                    .show(ctx, |ui| self.ui.show_review(ui, session));
                self.ui.show_review = open;
            }
            if let Some(report) = &self.report {
                let mut open = self.ui.show_chart;
                egui::Window::new("Performance Chart")
                    .open(&mut open)
                    .show(ctx, |ui| self.ui.show_chart(ui, report, self.chart_path.as_deref()));
                self.ui.show_chart = open;
            }
        }

        self.handle_action(action, frame);

        if self.timer.is_running() {
            ctx.request_repaint_after(Duration::from_secs(1));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::chart_path_for;
    use std::fs;
    use std::thread;
    use std::time::Instant;

    const QUESTIONS: &str = "question,option_a,option_b,option_c,option_d,correct_answer\n\
        Q1,a,b,c,d,A\n\
        Q2,a,b,c,d,B\n\
        Q3,a,b,c,d,C\n";

    fn app_in(dir: &tempfile::TempDir, questions: &str, duration_minutes: u64) -> QuizApp {
        let questions_file = dir.path().join("quiz.csv");
        fs::write(&questions_file, questions).unwrap();
        let config = AppConfig {
            questions_file,
            results_dir: dir.path().join("results"),
            duration_minutes,
            ..AppConfig::default()
        };
        QuizApp::with_context(egui::Context::default(), config, dir.path().join("quizconfig.cfg"))
    }

    fn logged_rows(app: &QuizApp) -> Vec<ResultRow> {
        ResultsLog::new(app.config.results_file()).rows().unwrap()
    }

    #[test]
    fn submit_persists_one_row_and_the_chart() {
        let dir = tempfile::tempdir().unwrap();
        let mut app = app_in(&dir, QUESTIONS, 10);

        app.start_quiz("ada".to_string());
        app.handle_answer(OptionLabel::A);
        app.submit_quiz();

        assert_eq!(app.state, AppState::QuizResults);
        assert!(!app.timer.is_running());
        let report = app.report.as_ref().unwrap();
        assert_eq!(report.score_label(), "1/3");
        assert!(app.save_errors.is_empty(), "{:?}", app.save_errors);

        let rows = logged_rows(&app);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].user_name, "ada");
        assert_eq!(rows[0].percentage, "33.33%");
        assert_eq!(app.history, rows);

        let chart = chart_path_for(&app.config.results_dir, "ada");
        assert_eq!(app.chart_path.as_deref(), Some(chart.as_path()));
        assert!(chart.exists());

        let saved = AppConfig::load_from(&dir.path().join("quizconfig.cfg"));
        assert_eq!(saved.recent_users[0].0, "ada");
    }

    #[test]
    fn each_session_appends_its_own_row() {
        let dir = tempfile::tempdir().unwrap();
        let mut app = app_in(&dir, QUESTIONS, 10);

        app.start_quiz("ada".to_string());
        app.submit_quiz();
        app.take_again();
        assert_eq!(app.state, AppState::NameEntry);
        assert!(app.session.is_none());

        app.start_quiz("ada".to_string());
        app.handle_answer(OptionLabel::A);
        app.submit_quiz();

        let rows = logged_rows(&app);
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].score, "0/3");
        assert_eq!(rows[1].score, "1/3");
        assert_eq!(app.history.len(), 2);
    }

    #[test]
    fn timer_expiry_submits_the_quiz() {
        let dir = tempfile::tempdir().unwrap();
        let mut app = app_in(&dir, QUESTIONS, 0);

        app.start_quiz("ada".to_string());
        app.handle_answer(OptionLabel::A);

        let start = Instant::now();
        while app.state != AppState::QuizResults && start.elapsed() < Duration::from_secs(2) {
            app.drain_timer_events();
            thread::sleep(Duration::from_millis(5));
        }

        assert_eq!(app.state, AppState::QuizResults);
        assert_eq!(app.report.as_ref().unwrap().score_label(), "1/3");
        assert_eq!(logged_rows(&app).len(), 1);
        assert!(app.chart_path.as_deref().is_some_and(|path| path.exists()));
    }

    #[test]
    fn expiry_outside_a_running_quiz_is_ignored() {
        let dir = tempfile::tempdir().unwrap();
        let mut app = app_in(&dir, QUESTIONS, 10);

        app.on_timer_event(TimerEvent::Expired);
        assert_eq!(app.state, AppState::NameEntry);
        assert!(!app.config.results_file().exists());

        app.start_quiz("ada".to_string());
        app.submit_quiz();
        app.on_timer_event(TimerEvent::Expired);
        assert_eq!(app.state, AppState::QuizResults);
        assert_eq!(logged_rows(&app).len(), 1);
    }

    #[test]
    fn empty_question_file_still_completes() {
        let dir = tempfile::tempdir().unwrap();
        let mut app = app_in(&dir, "not,a,quiz\n", 10);
        assert!(app.store.is_empty());

        app.start_quiz("ada".to_string());
        app.submit_quiz();

        let report = app.report.as_ref().unwrap();
        assert_eq!(report.score_label(), "0/0");
        assert_eq!(report.status().to_string(), "Fail");
        assert_eq!(logged_rows(&app).len(), 1);
    }

    #[test]
    fn view_chart_reports_a_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let mut app = app_in(&dir, QUESTIONS, 10);
        app.start_quiz("ada".to_string());
        app.submit_quiz();

        fs::remove_file(app.chart_path.as_ref().unwrap()).unwrap();
        app.ui.open_chart(app.chart_path.as_deref());
        assert!(app.ui.show_chart);
        assert_eq!(app.ui.chart_message(), Some(crate::ui::CHART_MISSING_MESSAGE));
    }
}
