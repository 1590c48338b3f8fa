use std::fs;
use std::path::{Path, PathBuf};

use camp_donations::PipelineConfig;
use camp_donations::config::InputPaths;
use tempfile::TempDir;

pub const CAMPS_HEADER: &str = "camp_id,start_date,end_date,category1,category2,category3";
pub const ATTENDANCE_HEADER: &str = "patient_id,camp_id,donation,health_score";
pub const PROFILES_HEADER: &str = "patient_id,online_follower,linkedin_shared,twitter_shared,facebook_shared,income,education_score,age,first_interaction,city_type,employer_category";

/// A temporary directory holding the three input files
pub struct Fixture {
    pub dir: TempDir,
    pub inputs: InputPaths,
}

impl Fixture {
    /// Write the given rows (without headers) to fresh input files
    #[must_use]
    pub fn new(camps: &[String], attendance: &[String], profiles: &[String]) -> Self {
        let dir = tempfile::tempdir().expect("create temp dir");
        let inputs = InputPaths {
            camps: write_csv(dir.path(), "camps.csv", CAMPS_HEADER, camps),
            attendance: write_csv(dir.path(), "attendance.csv", ATTENDANCE_HEADER, attendance),
            profiles: write_csv(dir.path(), "profiles.csv", PROFILES_HEADER, profiles),
        };
        Self { dir, inputs }
    }

    /// Output directory inside the fixture
    #[must_use]
    pub fn output_dir(&self) -> PathBuf {
        self.dir.path().join("denormalized")
    }

    /// A configuration reading this fixture with a small worker pool
    #[must_use]
    pub fn config(&self) -> PipelineConfig {
        PipelineConfig {
            inputs: self.inputs.clone(),
            output_dir: self.output_dir(),
            worker_threads: 2,
            ..PipelineConfig::default()
        }
    }
}

/// Write a CSV file with a header row
pub fn write_csv(dir: &Path, name: &str, header: &str, rows: &[String]) -> PathBuf {
    let path = dir.join(name);
    let mut content = String::from(header);
    for row in rows {
        content.push('\n');
        content.push_str(row);
    }
    content.push('\n');
    fs::write(&path, content).expect("write fixture");
    path
}

/// The single camp, attendance and profile row of the worked example
#[must_use]
pub fn single_patient() -> Fixture {
    Fixture::new(
        &["C1,2023-01-01,2023-01-05,First,Second,2".to_string()],
        &["P1,C1,25,4.5".to_string()],
        &["P1,1,0,0,1,,Graduate,30,2022-06-01,B,IT".to_string()],
    )
}

/// `patients` patients spread over three camps, half of them generous donors
///
/// Donors have higher health scores, so the classes are learnable but overlap.
#[must_use]
pub fn population(patients: usize) -> Fixture {
    let camps: Vec<String> = (1..=3)
        .map(|c| format!("C{c},2023-0{c}-01,2023-0{c}-10,Cat{c},Sub{c},{c}"))
        .collect();

    let attendance: Vec<String> = (0..patients)
        .map(|p| {
            let donor = p % 2 == 0;
            let donation = if donor { 30 + p % 50 } else { p % 15 };
            let score = (p % 10) as f64 * 0.5 + if donor { 3.0 } else { 0.0 };
            format!("P{p},C{},{donation},{score}", p % 3 + 1)
        })
        .collect();

    let profiles: Vec<String> = (0..patients)
        .map(|p| {
            format!(
                "P{p},{},{},{},{},{},Graduate,{},2022-01-01,{},{}",
                p % 2,
                (p / 2) % 2,
                (p / 3) % 2,
                (p / 5) % 2,
                p % 5,
                20 + p % 40,
                if p % 2 == 0 { "A" } else { "B" },
                if p % 3 == 0 { "IT" } else { "Health" },
            )
        })
        .collect();

    Fixture::new(&camps, &attendance, &profiles)
}
