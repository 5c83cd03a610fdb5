mod app;
mod chart;
mod config;
mod quiz;
mod report;
mod session;
mod timer;
mod ui;

use app::QuizApp;
use config::AppConfig;
use eframe::egui;
use simplelog::{ColorChoice, CombinedLogger, LevelFilter, SharedLogger, TermLogger, TerminalMode, WriteLogger};
use std::fs::{self, File};
use std::path::PathBuf;

fn init_logging() {
    let log_dir = dirs::data_local_dir()
        .map(|dir| dir.join("quiz_master"))
        .unwrap_or_else(|| PathBuf::from("."));

    let mut loggers: Vec<Box<dyn SharedLogger>> = vec![TermLogger::new(
        LevelFilter::Info,
        simplelog::Config::default(),
        TerminalMode::Mixed,
        ColorChoice::Auto,
    )];
    if fs::create_dir_all(&log_dir).is_ok() {
        if let Ok(file) = File::create(log_dir.join("quiz_master.log")) {
            loggers.push(WriteLogger::new(LevelFilter::Debug, simplelog::Config::default(), file));
        }
    }
    let _ = CombinedLogger::init(loggers);
}

fn main() -> Result<(), eframe::Error> {
    init_logging();
    let config = AppConfig::load();

    let options = eframe::NativeOptions {
        initial_window_size: Some(egui::vec2(900.0, 700.0)),
        resizable: false,
        ..Default::default()
    };

    eframe::run_native(
        "Quiz Master",
        options,
        Box::new(move |cc| Box::new(QuizApp::new(cc, config))),
    )
}
