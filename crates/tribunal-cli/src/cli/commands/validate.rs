//! `tribunal validate`: dry-run the configuration and input layout
//! without calling any judge.

use super::super::args::ValidateArgs;
use super::fail;
use crate::exit_codes;
use tribunal_core::config::{load_criteria, Settings};
use tribunal_core::source::{FsTranscriptSource, TranscriptSource};

pub async fn run(args: ValidateArgs) -> anyhow::Result<i32> {
    let settings = match Settings::load(&args.config) {
        Ok(s) => s,
        Err(e) => return Ok(fail(&e)),
    };
    let criteria = match load_criteria(&settings.criteria_path) {
        Ok(c) => c,
        Err(e) => return Ok(fail(&e)),
    };

    let source = FsTranscriptSource::new(&settings.processing.input_dir);
    let units = match source.discover().await {
        Ok(units) => units,
        Err(e) => return Ok(fail(&e)),
    };

    println!(
        "OK: {} criteria, {} evaluable games under {}",
        criteria.len(),
        units.len(),
        settings.processing.input_dir.display()
    );
    for unit in &units {
        let applicable = criteria.criteria_for_size(unit.size());
        println!(
            "  {} ({} players, {} applicable criteria)",
            unit.unit_id,
            unit.size(),
            applicable.len()
        );
    }
    if units.is_empty() {
        eprintln!("warning: no evaluable games found; a run would abort");
        return Ok(exit_codes::INFRA_ERROR);
    }
    Ok(exit_codes::SUCCESS)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;
    use tempfile::tempdir;
    use tribunal_core::model::Participant;
    use tribunal_core::source::write_unit_fixture;

    fn write_config(dir: &Path, input_dir: &Path) -> std::path::PathBuf {
        let criteria_path = dir.join("criteria.yaml");
        std::fs::write(
            &criteria_path,
            "common_criteria:\n  - name: persuasion\n    description: who drove the discussion\n    applicable_games: [2]\n    order: 1\n",
        )
        .unwrap();

        let settings_path = dir.join("settings.yaml");
        std::fs::write(
            &settings_path,
            format!(
                "processing:\n  input_dir: {}\n  output_dir: {}\njudge:\n  model: gpt-4o\ncriteria_path: {}\n",
                input_dir.display(),
                dir.join("out").display(),
                criteria_path.display(),
            ),
        )
        .unwrap();
        settings_path
    }

    #[tokio::test]
    async fn well_formed_layout_validates_cleanly() {
        let dir = tempdir().unwrap();
        let input = dir.path().join("games");
        std::fs::create_dir(&input).unwrap();
        write_unit_fixture(
            &input,
            "g1",
            &[
                Participant {
                    name: "a".into(),
                    team: "team-a".into(),
                    profile: None,
                },
                Participant {
                    name: "b".into(),
                    team: "team-b".into(),
                    profile: None,
                },
            ],
            "log",
        )
        .unwrap();
        let settings_path = write_config(dir.path(), &input);

        let code = run(ValidateArgs {
            config: settings_path,
        })
        .await
        .unwrap();
        assert_eq!(code, exit_codes::SUCCESS);
    }

    #[tokio::test]
    async fn empty_input_directory_flags_an_unrunnable_setup() {
        let dir = tempdir().unwrap();
        let input = dir.path().join("games");
        std::fs::create_dir(&input).unwrap();
        let settings_path = write_config(dir.path(), &input);

        let code = run(ValidateArgs {
            config: settings_path,
        })
        .await
        .unwrap();
        assert_eq!(code, exit_codes::INFRA_ERROR);
    }

    #[tokio::test]
    async fn missing_settings_file_is_a_config_error() {
        let code = run(ValidateArgs {
            config: "/definitely/not/here.yaml".into(),
        })
        .await
        .unwrap();
        assert_eq!(code, exit_codes::CONFIG_ERROR);
    }
}
