//! Student Record Model
//! Column names of the egressos table and the typed row built from it.

use chrono::NaiveDate;
use serde::Serialize;

pub const COL_PROGRAM: &str = "Programa";
pub const COL_REGISTRATION: &str = "Registro";
pub const COL_NAME: &str = "Nome";
pub const COL_ADMISSION: &str = "Adm";
pub const COL_STATUS: &str = "Sit";
pub const COL_BIRTH: &str = "Nascimento";
pub const COL_LEVEL: &str = "Nivel";
pub const COL_SEX: &str = "Sexo";

/// Columns the source CSV must carry.
pub const REQUIRED_COLUMNS: [&str; 8] = [
    COL_PROGRAM,
    COL_REGISTRATION,
    COL_NAME,
    COL_ADMISSION,
    COL_STATUS,
    COL_BIRTH,
    COL_LEVEL,
    COL_SEX,
];

// Derived columns
pub const COL_ADMISSION_YEAR: &str = "AnoAdm";
pub const COL_GRADUATION_YEAR: &str = "AnoGrad";
pub const COL_MONTHS_TO_GRADUATION: &str = "MesesParaGrad";
pub const COL_AGE_AT_GRADUATION: &str = "IdadeNaGraduacao";

/// Academic level of a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum Level {
    Masters,
    Doctorate,
}

impl Level {
    /// Stacking order used by the level charts.
    pub const ALL: [Level; 2] = [Level::Masters, Level::Doctorate];

    /// Label as it appears in the `Nivel` column.
    pub fn label(&self) -> &'static str {
        match self {
            Level::Masters => "MESTRADO",
            Level::Doctorate => "DOUTORADO",
        }
    }

    /// Short tag used in titles and exported column suffixes.
    pub fn short(&self) -> &'static str {
        match self {
            Level::Masters => "MSc",
            Level::Doctorate => "PhD",
        }
    }

    /// Portuguese name used in chart titles.
    pub fn title(&self) -> &'static str {
        match self {
            Level::Masters => "Mestrado",
            Level::Doctorate => "Doutorado",
        }
    }

    /// Reference durations (months) drawn on the duration violins:
    /// the expected and the maximum time to graduate.
    pub fn duration_thresholds(&self) -> (f64, f64) {
        match self {
            Level::Masters => (24.0, 36.0),
            Level::Doctorate => (48.0, 60.0),
        }
    }

    pub fn from_label(label: &str) -> Option<Self> {
        match label.trim() {
            "MESTRADO" => Some(Level::Masters),
            "DOUTORADO" => Some(Level::Doctorate),
            _ => None,
        }
    }
}

/// Sex of a record, as reported in the `Sexo` column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Sex {
    Male,
    Female,
    Unspecified,
}

impl Sex {
    pub fn label(&self) -> &'static str {
        match self {
            Sex::Male => "Masculino",
            Sex::Female => "Feminino",
            Sex::Unspecified => "n/d",
        }
    }

    pub fn from_label(label: &str) -> Self {
        match label.trim() {
            "Masculino" => Sex::Male,
            "Feminino" => Sex::Female,
            _ => Sex::Unspecified,
        }
    }
}

/// One retained row of the derived egressos table.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StudentRecord {
    pub program: String,
    pub name: String,
    pub registration_id: String,
    pub admission_date: NaiveDate,
    pub status_date: NaiveDate,
    pub birth_date: NaiveDate,
    pub level: Level,
    pub sex: Sex,
    pub admission_year: i32,
    pub graduation_year: i32,
    pub months_to_graduation: f64,
    pub age_at_graduation: f64,
}

impl StudentRecord {
    /// Days elapsed between admission and the final status.
    pub fn days_enrolled(&self) -> i64 {
        (self.status_date - self.admission_date).num_days()
    }
}
