//! Command line tool to train, evaluate and save the sentiment model

use anyhow::{anyhow, Result};
use pico_args::Arguments;
use sentiment_analysis::{
    config::Config,
    datasets::wikidetox,
    models::{artifact, SentimentEstimator},
    pipelines::text_classification,
    utils::renderer::{Renderer, Simple},
};

const HELP: &str = "\
Usage: train [OPTIONS]

Options:
  -h, --help             Print help
  -c, --config           Path to a JSON config file
  -d, --dataset          Path to the tab-separated dataset
  -m, --model            Where to write the model artifact
  -s, --seed             Seed for the train/test split
  -t, --test-fraction    Fraction of rows held out for evaluation (e.g., 0.2)
  -n, --num-trees        Number of boosted trees
  -l, --num-leaves       Maximum leaves per tree
  -r, --learning-rate    Boosting learning rate
  --top-features         How many influential n-grams to print (defaults to 10)
";

#[derive(Debug)]
struct Args {
    config: Option<String>,
    dataset: Option<String>,
    model: Option<String>,
    seed: Option<u64>,
    test_fraction: Option<f64>,
    num_trees: Option<usize>,
    num_leaves: Option<usize>,
    learning_rate: Option<f64>,
    top_features: usize,
}

impl Args {
    fn parse() -> Result<Option<Self>> {
        let mut pargs = Arguments::from_env();

        // Help has a higher priority and should be handled separately.
        if pargs.contains(["-h", "--help"]) {
            return Ok(None);
        }

        let args = Args {
            config: pargs.opt_value_from_str(["-c", "--config"])?,
            dataset: pargs.opt_value_from_str(["-d", "--dataset"])?,
            model: pargs.opt_value_from_str(["-m", "--model"])?,
            seed: pargs.opt_value_from_str(["-s", "--seed"])?,
            test_fraction: pargs.opt_value_from_str(["-t", "--test-fraction"])?,
            num_trees: pargs.opt_value_from_str(["-n", "--num-trees"])?,
            num_leaves: pargs.opt_value_from_str(["-l", "--num-leaves"])?,
            learning_rate: pargs.opt_value_from_str(["-r", "--learning-rate"])?,
            top_features: pargs.opt_value_from_str("--top-features")?.unwrap_or(10),
        };

        let remaining = pargs.finish();
        if !remaining.is_empty() {
            return Err(anyhow!("Unexpected arguments: {:?}", remaining));
        }

        Ok(Some(args))
    }

    fn into_config(self) -> Result<Config> {
        let mut config = match &self.config {
            Some(path) => Config::load(path)?,
            None => Config::default(),
        };

        if let Some(dataset) = self.dataset {
            config.dataset_path = dataset.into();
        }

        if let Some(model) = self.model {
            config.model_path = model.into();
        }

        if let Some(seed) = self.seed {
            config.training.seed = seed;
        }

        if let Some(test_fraction) = self.test_fraction {
            config.training.test_fraction = test_fraction;
        }

        if let Some(num_trees) = self.num_trees {
            config.booster.num_trees = num_trees;
        }

        if let Some(num_leaves) = self.num_leaves {
            config.booster.num_leaves = num_leaves;
        }

        if let Some(learning_rate) = self.learning_rate {
            config.booster.learning_rate = learning_rate;
        }

        Ok(config)
    }
}

fn main() -> Result<()> {
    pretty_env_logger::init();

    let Some(args) = Args::parse()? else {
        print!("{}", HELP);

        return Ok(());
    };

    let top_features = args.top_features;
    let config = args.into_config()?;
    let mut renderer = Simple::stdout();

    let dataset = wikidetox::Dataset::load(&config.dataset_path, &config.dataset)?;
    let estimator = SentimentEstimator::from_config(&config);

    renderer.header("Training the model")?;
    let (model, metrics) = text_classification::train(&dataset, &config.training, &estimator)?;

    renderer.header("Evaluating Model's accuracy with Test data")?;
    renderer.metrics(&metrics)?;

    if top_features > 0 {
        println!("Most influential n-grams:");
        for (ngram, gain) in model.top_features(top_features) {
            println!("  {:<24} {:.3}", format!("{ngram:?}"), gain);
        }
    }

    artifact::save(&model, &config.model_path)?;
    println!("The model is saved to {}", config.model_path.display());

    renderer.header("End of training process")?;

    Ok(())
}
