//! Register command for creating or updating athlete profiles.

use std::io::Write;

use anyhow::{Context, Result};
use et_core::AthleteProfile;

use crate::Config;
use crate::cli::RegisterArgs;
use crate::commands::util::{open_database, restore_tracker};

pub fn run<W: Write>(writer: &mut W, args: &RegisterArgs, config: &Config) -> Result<()> {
    let db = open_database(config)?;
    let tracker = restore_tracker(&db, None)?;
    let existed = tracker.athlete(&args.id).is_some();

    let profile = AthleteProfile {
        sweat_rate_liter_per_hour: args.sweat_rate,
        sodium_loss_rate_mg_per_liter: args.sodium_loss,
        baseline_heart_rate_bpm: args.baseline_hr,
        ..AthleteProfile::new(
            args.age,
            args.gender,
            args.weight_kg,
            args.height_cm,
            args.activity_level,
        )
    };

    let athlete = tracker
        .register_athlete(args.id.clone(), profile)
        .context("invalid athlete profile")?;
    db.upsert_athlete(&athlete)
        .context("failed to save athlete")?;

    let verb = if existed { "Updated" } else { "Registered" };
    writeln!(writer, "{verb} athlete {}", athlete.id)?;
    let p = &athlete.profile;
    writeln!(
        writer,
        "Profile: {} y, {}, {:.1} kg, {:.1} cm, {}",
        p.age, p.gender, p.weight_kg, p.height_cm, p.activity_level
    )?;
    if !athlete.history().is_empty() {
        writeln!(writer, "Workouts on record: {}", athlete.history().len())?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    use et_core::{ActivityLevel, AthleteId, Gender};
    use insta::assert_snapshot;

    fn config(temp: &tempfile::TempDir) -> Config {
        Config {
            database_path: temp.path().join("et.db"),
            model_path: temp.path().join("model.json"),
            ..Config::default()
        }
    }

    fn args() -> RegisterArgs {
        RegisterArgs {
            id: AthleteId::new("athlete_001").unwrap(),
            age: 25,
            gender: Gender::Male,
            weight_kg: 70.0,
            height_cm: 175.0,
            activity_level: ActivityLevel::Competitive,
            sweat_rate: None,
            sodium_loss: None,
            baseline_hr: Some(60),
        }
    }

    #[test]
    fn register_then_update() {
        let temp = tempfile::tempdir().unwrap();
        let config = config(&temp);

        let mut output = Vec::new();
        run(&mut output, &args(), &config).unwrap();
        assert_snapshot!(String::from_utf8(output).unwrap(), @r"
        Registered athlete athlete_001
        Profile: 25 y, M, 70.0 kg, 175.0 cm, competitive
        ");

        let mut output = Vec::new();
        let heavier = RegisterArgs {
            weight_kg: 71.5,
            ..args()
        };
        run(&mut output, &heavier, &config).unwrap();
        assert_snapshot!(String::from_utf8(output).unwrap(), @r"
        Updated athlete athlete_001
        Profile: 25 y, M, 71.5 kg, 175.0 cm, competitive
        ");

        let db = et_db::Database::open(&config.database_path).unwrap();
        assert_eq!(db.summary().unwrap().athletes, 1);
    }

    #[test]
    fn invalid_profile_is_rejected() {
        let temp = tempfile::tempdir().unwrap();
        let config = config(&temp);
        let bad = RegisterArgs {
            weight_kg: -3.0,
            ..args()
        };

        let err = run(&mut Vec::new(), &bad, &config).unwrap_err();
        assert!(format!("{err:#}").contains("weight_kg"));

        let db = et_db::Database::open(&config.database_path).unwrap();
        assert_eq!(db.summary().unwrap().athletes, 0);
    }
}
