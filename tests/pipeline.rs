use male_mental_health::config::{BoundarySource, ImageSize};
use male_mental_health::pipeline::{self, MERGED_CSV};
use male_mental_health::{run, PipelineConfig, PipelineError};
use std::fs;
use std::path::Path;
use tempfile::TempDir;

const NOISE: &str = "\
1,Northeast,1,1,1,1,1,1,1,1,1
2,Midwest,1,1,1,1,1,1,1,1,1
3,South,1,1,1,1,1,1,1,1,1
4,West,1,1,1,1,1,1,1,1,1
5,Island Areas,1,1,1,1,1,1,1,1,1
";

const HEADER: &str = "\
Table 1 - State Estimates
Order,State,18+ Estimate,18+ 95% CI (Lower),18+ 95% CI (Upper),18-25 Estimate,18-25 95% CI (Lower),18-25 95% CI (Upper),26+ Estimate,26+ 95% CI (Lower),26+ 95% CI (Upper)
";

/// Survey table with estimates (in thousands) for each state.
fn survey(rows: &[(&str, &str)]) -> String {
    let mut text = format!("{HEADER}0,Total U.S.,\"1,000\",1,1,1,1,1,1,1,1\n{NOISE}");
    for (i, (state, estimate)) in rows.iter().enumerate() {
        text.push_str(&format!("{},{state},{estimate},1,1,1,1,1,1,1,1\n", i + 6));
    }
    text
}

const POPULATION: &str = "\
SUMLEV,REGION,NAME,SEX,AGE,POPEST2023_CIV
40,3,Alabama,0,10,500000
40,3,Alabama,0,18,1000
40,3,Alabama,0,40,99000
40,3,Alabama,0,999,250000
40,3,Alabama,1,18,400
40,3,Alabama,1,40,39600
40,4,Alaska,0,30,200000
40,4,Alaska,1,30,100000
40,4,Arizona,0,30,100000
40,4,Arizona,1,30,20000
";

const BOUNDARIES: &str = r#"{"type": "FeatureCollection", "features": [
  {"type": "Feature", "id": "01", "properties": {"name": "Alabama"},
   "geometry": {"type": "Polygon", "coordinates": [[[-88.4, 35.0], [-85.6, 35.0], [-85.0, 31.0], [-88.4, 30.2], [-88.4, 35.0]]]}},
  {"type": "Feature", "id": "02", "properties": {"name": "Alaska"},
   "geometry": {"type": "MultiPolygon", "coordinates": [
     [[[-168.0, 65.0], [-141.0, 69.6], [-141.0, 60.0], [-165.0, 60.0], [-168.0, 65.0]]],
     [[[-135.0, 58.0], [-133.0, 56.0], [-131.0, 55.0], [-135.0, 58.0]]]
   ]}}
]}"#;

fn write(path: &Path, contents: &str) {
    fs::write(path, contents).unwrap();
}

/// A project root with the four inputs and a local boundary file.
fn project(dir: &TempDir) -> PipelineConfig {
    let data = dir.path().join("Data");
    fs::create_dir_all(&data).unwrap();
    write(
        &data.join("mental_disorder.csv"),
        &survey(&[("Alabama", "20"), ("Alaska", "\"50.0\""), ("Arizona", "10"), ("Puerto Rico", "5")]),
    );
    write(
        &data.join("treatment_received.csv"),
        &survey(&[("Alabama", "10"), ("Alaska", "30"), ("Arizona", "2"), ("Puerto Rico", "1")]),
    );
    write(&data.join("sc-est2023-agesex-civ.csv"), POPULATION);
    write(
        &data.join("ami_by_gender.csv"),
        "Sex,AMI_pct,Treatment_pct\nFemale,26.2,56.1\nMale,20.0,40.0\n",
    );
    let boundary_path = dir.path().join("us-states.json");
    write(&boundary_path, BOUNDARIES);

    PipelineConfig {
        boundary_source: BoundarySource::File(boundary_path),
        national_treatment_overall_pct: 50.0,
        image: ImageSize {
            base_width: 240,
            base_height: 160,
            scale: 1,
        },
        ..PipelineConfig::from_root(dir.path())
    }
}

#[test]
fn test_pipeline_writes_every_output() {
    let dir = TempDir::new().unwrap();
    let config = project(&dir);

    let summary = run(&config).unwrap();

    let written: Vec<String> = summary
        .outputs
        .iter()
        .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
        .collect();
    assert_eq!(
        written,
        vec![
            MERGED_CSV,
            "fig_dis.jpg",
            "interactive_disorder-18plus.html",
            "fig_treat.jpg",
            "interactive_treatment-18plus.html",
            "fig_rate.jpg",
            "interactive_top10_male_treatment_rate.html",
            "fig_bottom_gap.jpg",
            "interactive_bottom10_male_treatment_gap.html",
        ]
    );
    for path in &summary.outputs {
        assert!(path.starts_with(dir.path().join("Visuals")));
        assert!(fs::metadata(path).unwrap().len() > 0, "{} is empty", path.display());
    }

    let image = image::open(dir.path().join("Visuals").join("fig_dis.jpg")).unwrap();
    assert_eq!((image.width(), image.height()), (240, 160));
}

#[test]
fn test_pipeline_indicators() {
    let dir = TempDir::new().unwrap();
    let summary = run(&project(&dir)).unwrap();
    let table = &summary.table;

    let states: Vec<&str> = table.regions.iter().map(|r| r.state.as_str()).collect();
    assert_eq!(states, vec!["Alabama", "Alaska", "Arizona"]);

    let excluded: Vec<&str> = summary.excluded.iter().map(|e| e.region.as_str()).collect();
    assert_eq!(excluded, vec!["Total U.S.", "Puerto Rico"]);

    // 80,000 of 400,000 adults with AMI across the three states.
    assert!((table.overall_ami_pct - 20.0).abs() < 1e-9);

    let alabama = &table.regions[0];
    assert_eq!(alabama.adults_18plus, 100_000.0);
    assert_eq!(alabama.adult_men_18plus, 40_000.0);
    assert!((alabama.disorder_pct - 20.0).abs() < 1e-9);
    assert!((alabama.treatment_pct - 10.0).abs() < 1e-9);
    assert!((alabama.state_ami_adjuster - 1.0).abs() < 1e-9);
    // 50% of adults with AMI treated, scaled by 40 / 50.
    assert!((alabama.male_treatment_rate - 40.0).abs() < 1e-9);
    assert!((alabama.estimated_men_with_ami - 8_000.0).abs() < 1e-6);

    let alaska = &table.regions[1];
    assert!((alaska.disorder_pct - 25.0).abs() < 1e-9);
    assert!((alaska.male_treatment_rate - 48.0).abs() < 1e-9);
}

#[test]
fn test_merged_csv_matches_table() {
    let dir = TempDir::new().unwrap();
    let summary = run(&project(&dir)).unwrap();

    let csv = fs::read_to_string(dir.path().join("Visuals").join(MERGED_CSV)).unwrap();
    let mut lines = csv.lines();
    let header = lines.next().unwrap();
    assert!(header.starts_with("State,Disorder_18plus,Treatment_18plus,Adults18plus,AdultMen18plus"));
    assert!(header.ends_with("MaleTreatmentRate"));
    assert_eq!(lines.count(), summary.table.len());
}

#[test]
fn test_bottom_chart_html_shows_positive_gap() {
    let dir = TempDir::new().unwrap();
    run(&project(&dir)).unwrap();

    let html = fs::read_to_string(
        dir.path()
            .join("Visuals")
            .join("interactive_bottom10_male_treatment_gap.html"),
    )
    .unwrap();
    assert!(html.contains("Alabama: 60.00%"));
    assert!(html.contains("-60.0"));
}

#[test]
fn test_region_without_boundary_is_dropped_from_maps_only() {
    let dir = TempDir::new().unwrap();
    let summary = run(&project(&dir)).unwrap();
    let visuals = dir.path().join("Visuals");

    // Arizona has survey and population rows but no boundary feature.
    assert!(summary.table.regions.iter().any(|r| r.state == "Arizona"));

    for map in ["interactive_disorder-18plus.html", "interactive_treatment-18plus.html"] {
        let html = fs::read_to_string(visuals.join(map)).unwrap();
        assert!(html.contains(r#""locations":["Alabama","Alaska"]"#), "{map}");
        assert!(!html.contains("Arizona"), "{map}");
    }

    let top = fs::read_to_string(visuals.join("interactive_top10_male_treatment_rate.html")).unwrap();
    assert!(top.contains(r#""x":["Alaska","Alabama","Arizona"]"#));
    let bottom = fs::read_to_string(visuals.join("interactive_bottom10_male_treatment_gap.html")).unwrap();
    assert!(bottom.contains("Arizona: 84.00%"));

    let csv = fs::read_to_string(visuals.join(MERGED_CSV)).unwrap();
    assert!(csv.lines().any(|line| line.starts_with("Arizona,")));
}

#[test]
fn test_negative_population_is_fatal() {
    let dir = TempDir::new().unwrap();
    let config = project(&dir);
    let population = POPULATION.replace("40,4,Alaska,1,30,100000", "40,4,Alaska,1,30,-5");
    write(&config.population_path(), &population);

    let err = run(&config).unwrap_err();
    assert!(matches!(err, PipelineError::Load(_)));
    assert!(err.to_string().contains("Alaska"));
}

#[test]
fn test_missing_boundary_file_is_fatal() {
    let dir = TempDir::new().unwrap();
    let config = PipelineConfig {
        boundary_source: BoundarySource::File(dir.path().join("absent.json")),
        ..project(&dir)
    };

    let err = run(&config).unwrap_err();
    assert!(matches!(err, PipelineError::Boundary(_)));
}

#[test]
fn test_malformed_estimate_is_fatal() {
    let dir = TempDir::new().unwrap();
    let config = project(&dir);
    write(
        &config.treatment_path(),
        &survey(&[("Alabama", "about 10"), ("Alaska", "30")]),
    );

    let err = pipeline::load_inputs(&config).unwrap_err();
    assert!(matches!(err, PipelineError::Load(_)));
    assert!(err.to_string().contains("about 10"));
}
