use std::{fs, io::Write, path::Path};

use pretty_assertions::assert_eq;
use sentiment_analysis::{
    config::{Config, DatasetConfig, TrainingConfig},
    datasets::{
        train_test_split,
        wikidetox::{self, SentimentIssue},
        Dataset,
    },
    models::{
        artifact::{self, ArtifactError},
        featurizer, gbdt, SentimentEstimator, SentimentModel,
    },
    pipelines::text_classification::{self, Predictor},
};
use tempfile::TempDir;

const TOXIC: [&str; 6] = [
    "you are a stupid idiot",
    "shut up you idiot",
    "this stupid edit is garbage",
    "what an idiot, go away",
    "stop vandalizing you moron",
    "you moron, this is garbage",
];

const CLEAN: [&str; 6] = [
    "thanks for the helpful edit",
    "I added a citation to the article",
    "please see the talk page for sources",
    "great work on this article",
    "the citation was fixed, thanks",
    "welcome to the project, see the talk page",
];

fn write_dataset(dir: &Path, rows: usize) -> std::path::PathBuf {
    let path = dir.join("toxicity.tsv");
    let mut file = fs::File::create(&path).unwrap();

    writeln!(file, "Label\trev_id\tcomment\tyear\tlogged_in\tns\tsample\tsplit").unwrap();

    for i in 0..rows {
        let (label, text) = if i % 2 == 0 {
            (1, TOXIC[(i / 2) % TOXIC.len()])
        } else {
            (0, CLEAN[(i / 2) % CLEAN.len()])
        };

        writeln!(file, "{label}\t{}\t{text}\t2015\tTrue\tarticle\trandom\ttrain", 1000 + i).unwrap();
    }

    path
}

fn estimator() -> SentimentEstimator {
    SentimentEstimator::new(
        featurizer::Config::default(),
        gbdt::Config::default().with_num_trees(25).with_min_data_in_leaf(3),
    )
}

fn train(dir: &Path) -> (SentimentModel, text_classification::BinaryClassificationMetrics) {
    let dataset_path = write_dataset(dir, 120);
    let dataset = wikidetox::Dataset::load(&dataset_path, &DatasetConfig::default()).unwrap();

    text_classification::train(&dataset, &TrainingConfig::default(), &estimator()).unwrap()
}

#[test]
fn trains_and_evaluates_on_a_held_out_split() {
    let dir = TempDir::new().unwrap();

    let (_, metrics) = train(dir.path());

    assert_eq!(metrics.count, 24);
    assert!(metrics.accuracy > 0.9);
    assert!(metrics.auc.unwrap() > 0.9);
    assert!((0.0..=1.0).contains(&metrics.f1_score));
    assert!(metrics.log_loss >= 0.0);
}

#[test]
fn held_out_probabilities_stay_in_the_unit_interval() {
    let dir = TempDir::new().unwrap();
    let (model, _) = train(dir.path());

    let dataset_path = dir.path().join("toxicity.tsv");
    let dataset = wikidetox::Dataset::load(&dataset_path, &DatasetConfig::default()).unwrap();
    let config = TrainingConfig::default();
    let split = train_test_split(&dataset, config.test_fraction, config.seed).unwrap();
    let predictor = Predictor::from_model(model);

    assert_eq!(split.test.len(), 24);
    for issue in split.test.iter() {
        let prediction = predictor.predict(&issue.text);

        assert!((0.0..=1.0).contains(&prediction.probability), "{:?}", issue.text);
        assert_eq!(prediction.predicted_label, prediction.probability > 0.5);
    }
}

#[test]
fn a_single_toxic_row_trains_wherever_it_sits() {
    for position in 0..20 {
        let issues: Vec<SentimentIssue> = (0..20)
            .map(|i| {
                if i == position {
                    SentimentIssue::new(true, TOXIC[0].to_string())
                } else {
                    SentimentIssue::new(false, CLEAN[i % CLEAN.len()].to_string())
                }
            })
            .collect();
        let dataset = wikidetox::Dataset::from(issues);

        let result = text_classification::train(&dataset, &TrainingConfig::default(), &estimator());

        let (_, metrics) = result.unwrap_or_else(|e| panic!("toxic row at {position}: {e}"));
        assert_eq!(metrics.count, 4);
        assert!((0.0..=1.0).contains(&metrics.accuracy));
    }
}

#[test]
fn training_is_reproducible_for_a_seed() {
    let dir = TempDir::new().unwrap();

    let (first_model, first_metrics) = train(dir.path());
    let (second_model, second_metrics) = train(dir.path());

    assert_eq!(first_metrics, second_metrics);
    assert_eq!(first_model, second_model);
}

#[test]
fn saved_model_predicts_identically_after_loading() {
    let dir = TempDir::new().unwrap();
    let (model, _) = train(dir.path());
    let config = Config::default().with_model_path(dir.path().join("models/SentimentModel.json"));

    artifact::save(&model, &config.model_path).unwrap();

    let in_memory = Predictor::from_model(model);
    let loaded = Predictor::<SentimentModel>::load(&config.model_path).unwrap();

    for text in TOXIC.iter().chain(CLEAN.iter()).chain(["", "completely unseen words"].iter()) {
        assert_eq!(in_memory.predict(text), loaded.predict(text));
    }

    let toxic = loaded.predict("you are a stupid idiot");
    assert!(toxic.predicted_label);
    assert_eq!(toxic.label_text(), "Toxic");

    let clean = loaded.predict("thanks for the helpful edit");
    assert!(!clean.predicted_label);
    assert_eq!(clean.label_text(), "Non Toxic");
}

#[test]
fn reload_picks_up_a_retrained_artifact() {
    let dir = TempDir::new().unwrap();
    let (model, _) = train(dir.path());
    let path = dir.path().join("model.json");

    artifact::save(&model, &path).unwrap();
    let mut predictor = Predictor::<SentimentModel>::load(&path).unwrap();

    fs::write(&path, b"{ not a model").unwrap();
    assert!(matches!(predictor.reload(), Err(ArtifactError::Corrupt { .. })));
    assert_eq!(predictor.model().as_ref(), &model);

    artifact::save(&model, &path).unwrap();
    predictor.reload().unwrap();
    assert_eq!(predictor.model_path(), Some(path.as_path()));
}

#[test]
fn loading_reports_missing_and_corrupt_artifacts() {
    let dir = TempDir::new().unwrap();
    let missing = dir.path().join("missing.json");
    let garbage = dir.path().join("garbage.json");
    fs::write(&garbage, [0xff, 0x00, 0x13, 0x37]).unwrap();

    assert!(matches!(
        Predictor::<SentimentModel>::load(&missing),
        Err(ArtifactError::Io { .. })
    ));
    assert!(matches!(
        Predictor::<SentimentModel>::load(&garbage),
        Err(ArtifactError::Corrupt { .. })
    ));
}

#[test]
fn single_class_data_is_rejected() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("clean.tsv");
    let rows: String = CLEAN
        .iter()
        .cycle()
        .take(30)
        .map(|text| format!("0\t1\t{text}\n"))
        .collect();
    fs::write(&path, format!("Label\trev_id\tcomment\n{rows}")).unwrap();

    let dataset = wikidetox::Dataset::load(&path, &DatasetConfig::default()).unwrap();
    let result = text_classification::train(&dataset, &TrainingConfig::default(), &estimator());

    assert_eq!(
        result.err(),
        Some(text_classification::TrainingError::SingleClass(false))
    );
}
