use std::collections::BTreeMap;
use std::fs::File;
use std::io::{self, BufReader, Cursor};
use tagmix::{Corpus, CorpusOptions, SamplerConfig, TagInducer, WriterObserver};

const TOY: &str = "\
1\tthe\t_\tDT
2\tdog\t_\tNN
3\truns\t_\tVBZ
4\t.\t_\t.

1\ta\t_\tDT
2\tcat\t_\tNN
3\tsleeps\t_\tVBZ
4\t.\t_\t.

1\tthe\t_\tDT
2\tbird\t_\tNN
3\tsings\t_\tVBZ
4\t.\t_\t.

1\ta\t_\tDT
2\tdog\t_\tNN
3\tsleeps\t_\tVBZ
4\t.\t_\t.
";

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Usage: induce [corpus.conll] [classes] [iterations]
    //
    // Without a corpus a tiny built-in one is used. Checkpoint lines go to
    // stderr as: iteration, logP, [M-1, VM], temperature, alpha, betas...
    let args: Vec<String> = std::env::args().collect();
    let classes: usize = args.get(2).map(|s| s.parse::<usize>()).transpose()?.unwrap_or(4);
    let iterations: usize = args.get(3).map(|s| s.parse::<usize>()).transpose()?.unwrap_or(200);

    let options = CorpusOptions::default().with_ignore_punct(true);
    let corpus = match args.get(1) {
        Some(path) => Corpus::read_conll(BufReader::new(File::open(path)?), options)?,
        None => Corpus::read_conll(Cursor::new(TOY), options)?,
    };
    println!(
        "sentences={} tokens={} types={}",
        corpus.num_sentences(),
        corpus.num_tokens(),
        corpus.num_types()
    );

    let features = corpus.feature_set()?;
    let config = SamplerConfig::new(classes)
        .with_iterations(iterations)
        .with_seed(42);
    let mut inducer = TagInducer::new(config);
    if let Some(gold) = corpus.gold_standard() {
        inducer = inducer.with_gold(gold);
    }

    let mut observer = WriterObserver::new(io::stderr());
    let outcome = inducer.run_with(&features, &mut observer)?;
    observer.finish()?;

    println!("best logP={:.3}", outcome.best_log_posterior());
    println!("hyperparameters: alpha={}", outcome.hyperparameters().class);

    let mut by_cluster: BTreeMap<usize, Vec<&str>> = BTreeMap::new();
    for (t, &c) in outcome.assignment().iter().enumerate() {
        by_cluster.entry(c).or_default().push(corpus.word(t));
    }
    for (c, words) in by_cluster {
        println!("  cluster {}: {}", c, words.join(" "));
    }

    if let Some(e) = outcome.evaluation() {
        println!("{e}");
    }
    Ok(())
}
