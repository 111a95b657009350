//! End-to-End CLI Tests for BeatPad
//!
//! These tests drive the `beatpad` binary through [`TestHarness`]:
//!
//! 1. Validate - config and corner file diagnostics
//! 2. Blend - cell and exact blends, direct fallback
//! 3. Grid - warming every cell
//! 4. Path - playback precompute
//!
//! ## Running Tests
//!
//! ```bash
//! cargo test -p beatpad-tests --test e2e
//! ```

use beatpad_spec::{EngineConfig, Point};
use beatpad_tests::fixtures::{diagonal_path, InputFixture};
use beatpad_tests::harness::TestHarness;
use serde_json::Value;

fn error_codes(output: &Value) -> Vec<String> {
    output["errors"]
        .as_array()
        .map(|errors| {
            errors
                .iter()
                .filter_map(|e| e["code"].as_str().map(str::to_string))
                .collect()
        })
        .unwrap_or_default()
}

// ============================================================================
// Module 1: Validate
// ============================================================================

mod validate {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let harness = TestHarness::new();
        let fixture = InputFixture::new();
        let config = fixture.write_config(&EngineConfig::default());

        let result = harness.validate_config(&config);
        result.assert_success();
        let output = result.json();
        assert_eq!(output["success"], true);
        assert_eq!(output["result"]["cells"], 16);
        assert_eq!(output["result"]["loop_steps"], 32);
    }

    #[test]
    fn test_zero_columns_is_reported() {
        let harness = TestHarness::new();
        let fixture = InputFixture::new();
        let config = fixture.write_config(&EngineConfig {
            columns: 0,
            ..EngineConfig::default()
        });

        let result = harness.validate_config(&config);
        result.assert_failure();
        let output = result.json();
        assert_eq!(output["success"], false);
        let errors = output["errors"].as_array().unwrap();
        assert!(errors.iter().any(|e| e["path"] == "columns"));
    }

    #[test]
    fn test_corner_summary() {
        let harness = TestHarness::new();
        let fixture = InputFixture::new();
        let config = fixture.write_config(&EngineConfig::default());
        let corners = fixture.write_partial_corners();

        let result = harness.run_cli(&[
            "validate",
            "--config",
            config.to_str().unwrap(),
            "--corners",
            corners.to_str().unwrap(),
            "--json",
        ]);
        result.assert_success();
        let summary = &result.json()["result"]["corners"];
        assert_eq!(summary["filled"], serde_json::json!(["a"]));
        assert_eq!(summary["complete"], false);
    }
}

// ============================================================================
// Module 2: Blend
// ============================================================================

mod blend {
    use super::*;

    #[test]
    fn test_blend_near_corner_b() {
        let harness = TestHarness::new();
        let fixture = InputFixture::new();
        let corners = fixture.write_corners();

        let result = harness.blend(&corners, 0.95, 0.05);
        result.assert_success();
        let report = &result.json()["result"];
        assert_eq!(report["cell"]["index"], 3);
        assert_eq!(report["source"]["kind"], "latent");
        assert_eq!(report["model_ready"], true);
        assert_eq!(report["pattern"]["snare"][4], true);
        assert_eq!(report["pattern"]["kick"][0], false);
    }

    #[test]
    fn test_partial_corners_blend_directly() {
        let harness = TestHarness::new();
        let fixture = InputFixture::new();
        let corners = fixture.write_partial_corners();

        let result = harness.blend(&corners, 0.1, 0.1);
        result.assert_success();
        let report = &result.json()["result"];
        assert_eq!(report["source"]["kind"], "direct");
        assert_eq!(report["pattern"]["kick"][0], true);
    }

    #[test]
    fn test_exact_blend_at_corner() {
        let harness = TestHarness::new();
        let fixture = InputFixture::new();
        let corners = fixture.write_corners();

        let result = harness.run_cli(&[
            "blend",
            "--corners",
            corners.to_str().unwrap(),
            "-x",
            "0",
            "-y",
            "1",
            "--exact",
            "--json",
        ]);
        result.assert_success();
        let report = &result.json()["result"];
        assert_eq!(report["exact"], true);
        assert!(report.get("source").is_none());
        assert_eq!(report["pattern"]["hat_closed"][0], true);
        assert_eq!(report["pattern"]["hat_closed"][1], false);
    }

    #[test]
    fn test_missing_corner_file() {
        let harness = TestHarness::new();
        let missing = harness.path().join("nope.json");

        let result = harness.blend(&missing, 0.5, 0.5);
        result.assert_failure();
        let output = result.json();
        assert_eq!(output["success"], false);
        assert!(error_codes(&output).contains(&"CLI_001".to_string()));
    }

    #[test]
    fn test_human_output() {
        let harness = TestHarness::new();
        let fixture = InputFixture::new();
        let corners = fixture.write_corners();

        let result = harness.run_cli(&[
            "blend",
            "--corners",
            corners.to_str().unwrap(),
            "-x",
            "0.5",
            "-y",
            "0.5",
        ]);
        result.assert_success();
        assert!(result.stdout.contains("kick"));
    }
}

// ============================================================================
// Module 3: Grid
// ============================================================================

mod grid {
    use super::*;

    #[test]
    fn test_grid_warms_every_cell() {
        let harness = TestHarness::new();
        let fixture = InputFixture::new();
        let corners = fixture.write_corners();

        let result = harness.grid(&corners, None);
        result.assert_success();
        let report = &result.json()["result"];
        assert_eq!(report["cells"].as_array().unwrap().len(), 16);
        assert_eq!(report["source"]["kind"], "latent");
        assert_eq!(report["stats"]["misses"], 16);
        assert_eq!(report["stats"]["entries"], 16);
    }

    #[test]
    fn test_grid_follows_config() {
        let harness = TestHarness::new();
        let fixture = InputFixture::new();
        let corners = fixture.write_corners();
        let config = fixture.write_config(&EngineConfig {
            columns: 3,
            rows: 2,
            ..EngineConfig::default()
        });

        let result = harness.grid(&corners, Some(&config));
        result.assert_success();
        let report = &result.json()["result"];
        assert_eq!(report["columns"], 3);
        assert_eq!(report["rows"], 2);
        assert_eq!(report["cells"].as_array().unwrap().len(), 6);
    }
}

// ============================================================================
// Module 4: Path
// ============================================================================

mod path {
    use super::*;

    #[test]
    fn test_diagonal_playback() {
        let harness = TestHarness::new();
        let fixture = InputFixture::new();
        let corners = fixture.write_corners();
        let path = fixture.write_path(&diagonal_path());

        let result = harness.path_playback(&corners, &path, 8);
        result.assert_success();
        let report = &result.json()["result"];
        assert_eq!(report["input_points"], 3);
        let steps = report["playback"]["steps"].as_array().unwrap();
        assert_eq!(steps.len(), 8);
        // Step 0 sits exactly on corner A.
        assert_eq!(steps[0]["position"]["x"], 0.0);
        assert_eq!(steps[0]["pattern"]["kick"][0], true);
        assert_eq!(steps[0]["pattern"]["ride"][0], false);
    }

    #[test]
    fn test_single_point_path_is_rejected() {
        let harness = TestHarness::new();
        let fixture = InputFixture::new();
        let corners = fixture.write_corners();
        let path = fixture.write_path(&[Point::CENTER]);

        let result = harness.path_playback(&corners, &path, 8);
        result.assert_failure();
        assert_eq!(result.json()["success"], false);
    }
}
