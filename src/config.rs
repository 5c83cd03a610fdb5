use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

pub const CONFIG_PATH: &str = "quizconfig.cfg";
const MAX_RECENT_USERS: usize = 10;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub questions_file: PathBuf,
    pub results_dir: PathBuf,
    pub duration_minutes: u64,
    pub dark_mode: bool,
    pub shuffle_questions: bool,
    pub recent_users: Vec<(String, i64)>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            questions_file: PathBuf::from("data/sample_quiz.csv"),
            results_dir: PathBuf::from("results"),
            duration_minutes: 10,
            dark_mode: true,
            shuffle_questions: false,
            recent_users: Vec::new(),
        }
    }
}

impl AppConfig {
    pub fn load() -> Self {
        Self::load_from(Path::new(CONFIG_PATH))
    }

    pub fn load_from(path: &Path) -> Self {
        match fs::read_to_string(path) {
            Ok(contents) => serde_json::from_str(&contents).unwrap_or_else(|e| {
                log::warn!("Ignoring unreadable config {}: {}", path.display(), e);
                Self::default()
            }),
            Err(_) => Self::default(),
        }
    }

    pub fn save_to(&self, path: &Path) -> Result<(), Box<dyn std::error::Error>> {
        let contents = serde_json::to_string_pretty(self)?;
        fs::write(path, contents)?;
        Ok(())
    }

    pub fn duration_secs(&self) -> u64 {
        self.duration_minutes.saturating_mul(60)
    }

    pub fn results_file(&self) -> PathBuf {
        self.results_dir.join("quiz_results.csv")
    }

    pub fn update_recent_users(&mut self, name: String) {
        let timestamp = chrono::Utc::now().timestamp();
        self.recent_users.retain(|(n, _)| n != &name);
        self.recent_users.insert(0, (name, timestamp));
        if self.recent_users.len() > MAX_RECENT_USERS {
            self.recent_users.truncate(MAX_RECENT_USERS);
        }
    }
}
