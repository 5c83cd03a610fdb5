use egui::{Color32, RichText, Ui};
use std::f32::consts::TAU;
use std::path::Path;

use crate::chart::{CORRECT_COLOR, INCORRECT_COLOR};
use crate::quiz::OptionLabel;
use crate::report::{ResultRow, ScoreReport, Status};
use crate::session::{Outcome, QuizSession};

const GOOD: Color32 = Color32::from_rgb(0x4C, 0xAF, 0x50);
const BAD: Color32 = Color32::from_rgb(0xFF, 0x6B, 0x35);

pub const EMPTY_NAME_MESSAGE: &str = "Please enter your name to start the quiz.";
pub const CHART_MISSING_MESSAGE: &str =
    "Performance chart not found. It could not be generated for this session.";

/// Trims the entered name, rejecting one that is empty or only whitespace.
pub fn validate_name(input: &str) -> Result<String, &'static str> {
    let name = input.trim();
    if name.is_empty() {
        Err(EMPTY_NAME_MESSAGE)
    } else {
        Ok(name.to_string())
    }
}

pub fn progress_label(session: &QuizSession) -> String {
    let position = if session.total() == 0 {
        0
    } else {
        session.current_index() + 1
    };
    format!("Question {} of {}", position, session.total())
}

#[derive(Default)]
pub struct QuizUI {
    pub name_input: String,
    pub name_error: Option<String>,
    pub show_review: bool,
    pub show_chart: bool,
    // Whether the chart file existed when the chart window was opened.
    pub chart_found: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QuizAction {
    None,
    StartQuiz(String),
    ChooseQuestionsFile,
    Answer(OptionLabel),
    PreviousQuestion,
    NextQuestion,
    SubmitQuiz,
    ViewChart,
    TakeAgain,
    Exit,
}

impl QuizUI {
    pub fn reset(&mut self) {
        self.name_input.clear();
        self.name_error = None;
        self.show_review = false;
        self.show_chart = false;
        self.chart_found = false;
    }

    /// Opens the chart window, checking once whether the chart file is on disk.
    pub fn open_chart(&mut self, chart_path: Option<&Path>) {
        self.chart_found = chart_path.is_some_and(|path| path.exists());
        if !self.chart_found {
            log::warn!("Chart requested but not found: {:?}", chart_path);
        }
        self.show_chart = true;
    }

    /// The message shown instead of the chart, if any.
    pub fn chart_message(&self) -> Option<&'static str> {
        if self.chart_found {
            None
        } else {
            Some(CHART_MISSING_MESSAGE)
        }
    }

    pub fn show_name_entry(
        &mut self,
        ui: &mut Ui,
        questions_file: &Path,
        question_count: usize,
        duration_minutes: u64,
        recent_users: &[(String, i64)],
    ) -> QuizAction {
        let mut action = QuizAction::None;

        ui.vertical_centered(|ui| {
            ui.add_space(40.0);
            ui.heading(RichText::new("Welcome to Quiz Master").size(32.0).strong());
            ui.label(format!(
                "{} minute timer • {} multiple choice questions • Instant results",
                duration_minutes, question_count
            ));
            ui.add_space(30.0);

            ui.label(RichText::new("Enter your name to begin:").size(18.0).strong());
            let response = ui.text_edit_singleline(&mut self.name_input);
            let entered = response.lost_focus() && ui.input(|i| i.key_pressed(egui::Key::Enter));

            if let Some(error) = &self.name_error {
                ui.label(RichText::new(error).color(Color32::RED));
            }

            ui.add_space(20.0);
            if ui.button(RichText::new("Start Quiz").size(18.0)).clicked() || entered {
                match validate_name(&self.name_input) {
                    Ok(name) => {
                        self.name_error = None;
                        action = QuizAction::StartQuiz(name);
                    }
                    Err(message) => self.name_error = Some(message.to_string()),
                }
            }

            if !recent_users.is_empty() {
                ui.add_space(20.0);
                ui.label("Recent users:");
                ui.horizontal_wrapped(|ui| {
                    for (name, _) in recent_users {
                        if ui.button(name).clicked() {
                            self.name_input = name.clone();
                        }
                    }
                });
            }

            ui.add_space(30.0);
            ui.separator();
            ui.label(format!("Questions file: {}", questions_file.display()));
            if question_count == 0 {
                ui.label(RichText::new("No questions could be loaded from this file.").color(BAD));
            }
            if ui.button("Choose Questions File").clicked() {
                action = QuizAction::ChooseQuestionsFile;
            }
        });

        action
    }

    pub fn show_question(&mut self, ui: &mut Ui, session: &QuizSession, remaining: &str) -> QuizAction {
        let mut action = QuizAction::None;
        let index = session.current_index();

        ui.horizontal(|ui| {
            ui.label(RichText::new(format!("Time Remaining: {}", remaining)).size(18.0).strong());
            ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                ui.label(progress_label(session));
            });
        });
        ui.separator();

        match session.current_question() {
            Some(question) => {
                ui.add_space(10.0);
                ui.label(RichText::new(&question.text).size(18.0));
                ui.add_space(10.0);

                let mut choice = session.answer_for(index);
                for label in OptionLabel::ALL {
                    let text = format!("{}. {}", label, question.option(label));
                    if ui.radio_value(&mut choice, Some(label), RichText::new(text).size(16.0)).clicked() {
                        action = QuizAction::Answer(label);
                    }
                }
            }
            None => {
                ui.label("No questions are available. Submit to finish the session.");
            }
        }

        ui.add_space(20.0);
        ui.horizontal(|ui| {
            if ui.add_enabled(!session.is_first(), egui::Button::new("Previous")).clicked() {
                action = QuizAction::PreviousQuestion;
            }
            if ui.add_enabled(!session.is_last(), egui::Button::new("Next")).clicked() {
                action = QuizAction::NextQuestion;
            }
            ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                if ui.button(RichText::new("Submit Quiz").color(BAD).strong()).clicked() {
                    action = QuizAction::SubmitQuiz;
                }
            });
        });

        action
    }

    pub fn show_results(
        &mut self,
        ui: &mut Ui,
        report: &ScoreReport,
        history: &[ResultRow],
        save_errors: &[String],
    ) -> QuizAction {
        let mut action = QuizAction::None;

        ui.vertical_centered(|ui| {
            ui.heading(RichText::new("Quiz Results").size(32.0).strong());
        });
        ui.separator();

        let status_color = match report.status() {
            Status::Pass => GOOD,
            Status::Fail => BAD,
        };
        ui.label(RichText::new(format!("Name: {}", report.user_name())).size(16.0));
        ui.label(RichText::new(format!("Score: {}", report.score_label())).size(16.0));
        ui.label(RichText::new(format!("Percentage: {}", report.percentage_label())).size(16.0));
        ui.label(RichText::new(format!("Status: {}", report.status())).size(16.0).color(status_color));
        ui.label(RichText::new(format!("Time Taken: {}", report.time_taken())).size(16.0));

        for error in save_errors {
            ui.label(RichText::new(error).color(Color32::RED));
        }

        if history.len() > 1 {
            ui.add_space(10.0);
            ui.label(RichText::new("Your attempts:").strong());
            egui::ScrollArea::vertical().max_height(120.0).show(ui, |ui| {
                for row in history.iter().rev() {
                    ui.label(format!(
                        "{}  {}  {}  {}  {}",
                        row.timestamp, row.score, row.percentage, row.status, row.time_taken
                    ));
                }
            });
        }

        ui.add_space(20.0);
        ui.separator();
        ui.horizontal(|ui| {
            if ui.button("View Questions").clicked() {
                self.show_review = true;
            }
            if ui.button("View Chart").clicked() {
                action = QuizAction::ViewChart;
            }
            if ui.button("Take Again").clicked() {
                action = QuizAction::TakeAgain;
            }
            if ui.button("Exit").clicked() {
                action = QuizAction::Exit;
            }
        });

        action
    }

    pub fn show_review(&mut self, ui: &mut Ui, session: &QuizSession) {
        let outcomes = session.review();

        egui::ScrollArea::vertical().show(ui, |ui| {
            for (heading, color, wanted) in [
                ("Correct Answers", GOOD, Outcome::Correct),
                ("Incorrect Answers", BAD, Outcome::Incorrect),
                ("Not Answered", BAD, Outcome::Unanswered),
            ] {
                let items: Vec<_> = outcomes.iter().filter(|o| o.outcome == wanted).collect();
                if items.is_empty() {
                    continue;
                }
                ui.add_space(10.0);
                ui.label(RichText::new(heading).size(18.0).strong().color(color));

                for item in items {
                    let Some(question) = session.question(item.index) else {
                        continue;
                    };
                    ui.group(|ui| {
                        ui.label(format!("Q{}: {}", item.index + 1, question.text));
                        if let Some(chosen) = item.chosen {
                            if item.outcome == Outcome::Incorrect {
                                ui.label(
                                    RichText::new(format!("Your Answer: {}. {}", chosen, question.option(chosen)))
                                        .color(BAD),
                                );
                            }
                        }
                        ui.label(
                            RichText::new(format!(
                                "Correct Answer: {}. {}",
                                item.correct,
                                question.correct_text()
                            ))
                            .strong()
                            .color(GOOD),
                        );
                    });
                }
            }
        });
    }

    /// Draws the saved chart's data, or an error when the chart file was missing.
    pub fn show_chart(&mut self, ui: &mut Ui, report: &ScoreReport, chart_path: Option<&Path>) {
        if let Some(message) = self.chart_message() {
            ui.label(RichText::new(message).color(Color32::RED));
            return;
        }

        ui.label(RichText::new(format!("Quiz Performance - {}", report.user_name())).size(18.0).strong());
        ui.label(format!("Score: {} ({})", report.score_label(), report.percentage_label()));

        let (response, painter) = ui.allocate_painter(egui::vec2(360.0, 320.0), egui::Sense::hover());
        let center = response.rect.center();
        let radius = 130.0;

        if report.total() == 0 {
            painter.circle_filled(center, radius, Color32::GRAY);
        } else {
            let correct_fraction = report.correct() as f32 / report.total() as f32;
            let correct_sweep = correct_fraction * TAU;
            let mid = correct_sweep / 2.0;
            let offset = egui::vec2(mid.sin(), -mid.cos()) * radius * 0.1;

            draw_slice(&painter, center + offset, radius, 0.0, correct_sweep, hex_color(CORRECT_COLOR));
            draw_slice(&painter, center, radius, correct_sweep, TAU, hex_color(INCORRECT_COLOR));
        }

        ui.horizontal(|ui| {
            ui.colored_label(hex_color(CORRECT_COLOR), format!("Correct: {}", report.correct()));
            ui.colored_label(hex_color(INCORRECT_COLOR), format!("Incorrect: {}", report.incorrect()));
        });
        if let Some(path) = chart_path {
            ui.label(RichText::new(format!("Saved to {}", path.display())).small());
        }
    }
}

/// Fills the wedge between `start` and `end`, radians clockwise from the top.
fn draw_slice(painter: &egui::Painter, center: egui::Pos2, radius: f32, start: f32, end: f32, color: Color32) {
    if end <= start {
        return;
    }
    let steps = ((end - start) / TAU * 96.0).ceil().max(1.0) as usize;
    let point = |angle: f32| center + egui::vec2(angle.sin(), -angle.cos()) * radius;
    for step in 0..steps {
        let a0 = start + (end - start) * step as f32 / steps as f32;
        let a1 = start + (end - start) * (step + 1) as f32 / steps as f32;
        painter.add(egui::Shape::convex_polygon(
            vec![center, point(a0), point(a1)],
            color,
            egui::Stroke::NONE,
        ));
    }
}

fn hex_color(hex: &str) -> Color32 {
    let channel = |range: std::ops::Range<usize>| {
        hex.get(range)
            .and_then(|digits| u8::from_str_radix(digits, 16).ok())
            .unwrap_or(0)
    };
    Color32::from_rgb(channel(1..3), channel(3..5), channel(5..7))
}
