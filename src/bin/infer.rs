//! Command line tool to classify sentences with a saved sentiment model

use std::io::{self, BufRead, Write};

use anyhow::{anyhow, Result};
use pico_args::Arguments;
use sentiment_analysis::{
    config::Config,
    models::SentimentModel,
    pipelines::text_classification::Predictor,
    utils::renderer::{Renderer, Simple},
};

const HELP: &str = "\
Usage: infer [OPTIONS] [TEXT]...

Arguments:
  TEXT                 Sentences to classify. Without any, an interactive prompt starts.

Options:
  -h, --help           Print help
  -c, --config         Path to a JSON config file
  -m, --model          Path to the model artifact

Prompt commands:
  :reload              Re-read the model artifact from disk
  exit, quit           Leave the prompt
";

#[derive(Debug)]
struct Args {
    /// Prints the usage menu
    help: bool,

    /// Optional config file
    config: Option<String>,

    /// Model artifact override
    model: Option<String>,

    /// Sentences given on the command line
    texts: Vec<String>,
}

fn parse_args() -> Result<Args> {
    let mut pargs = Arguments::from_env();

    let help = pargs.contains(["-h", "--help"]);
    let config = pargs.opt_value_from_str(["-c", "--config"])?;
    let model = pargs.opt_value_from_str(["-m", "--model"])?;

    let texts = pargs
        .finish()
        .into_iter()
        .map(|arg| {
            arg.into_string()
                .map_err(|arg| anyhow!("Argument is not valid UTF-8: {:?}", arg))
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(Args {
        help,
        config,
        model,
        texts,
    })
}

fn main() -> Result<()> {
    pretty_env_logger::init();

    let args = parse_args()?;

    if args.help {
        println!("{}", HELP);
        return Ok(());
    }

    let mut config = match &args.config {
        Some(path) => Config::load(path)?,
        None => Config::default(),
    };

    if let Some(model) = args.model {
        config.model_path = model.into();
    }

    let mut predictor = Predictor::<SentimentModel>::load(&config.model_path)?;
    let mut renderer = Simple::stdout();

    if !args.texts.is_empty() {
        for text in &args.texts {
            renderer.prediction(text, &predictor.predict(text))?;
        }

        return Ok(());
    }

    prompt(&mut predictor, &mut renderer)
}

/// Read one sentence per line until EOF or an exit command
fn prompt<R: Renderer>(predictor: &mut Predictor<SentimentModel>, renderer: &mut R) -> Result<()> {
    let stdin = io::stdin();
    let mut input = stdin.lock();
    let mut line = String::new();

    loop {
        println!("Please enter a sentence: ");
        io::stdout().flush()?;

        line.clear();
        if input.read_line(&mut line)? == 0 {
            return Ok(());
        }

        let text = line.trim_end_matches(['\r', '\n']);

        match text.trim() {
            "exit" | "quit" => return Ok(()),
            ":reload" => match predictor.reload() {
                Ok(()) => println!("Model reloaded"),
                Err(e) => log::warn!("Reload failed, keeping the current model: {}", e),
            },
            _ => renderer.prediction(text, &predictor.predict(text))?,
        }
    }
}
