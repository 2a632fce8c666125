//! Collapsed Gibbs driver.
//!
//! [`TagInducer`] holds the configuration; [`TagInducer::initialise`] binds it
//! to a [`FeatureSet`] and returns a [`Chain`] with a uniformly random
//! assignment; [`Chain::run`] consumes the chain and returns an [`Outcome`].
//!
//! One iteration sweeps every word type in index order. Every
//! `hyper_interval` iterations the chain checkpoints: full log posterior,
//! best-state update (strict improvement only), hyperparameter resampling,
//! report.

use super::categorical::CategoricalSampler;
use super::hyper::{HyperResampler, Hyperparameters};
use super::observer::{IterationReport, LogObserver, SamplerObserver};
use super::posterior::{score_clusters, LogPosterior};
use super::schedule::TemperatureSchedule;
use super::stats::SufficientStats;
use crate::config::SamplerConfig;
use crate::error::Result;
use crate::features::FeatureSet;
use crate::metrics::{Evaluation, GoldStandard};
use crate::traits::Clustering;
use rand::prelude::*;

/// Word-class inducer: a configured, not yet initialised sampler.
#[derive(Debug, Clone)]
pub struct TagInducer {
    config: SamplerConfig,
    gold: Option<GoldStandard>,
}

impl TagInducer {
    /// Create an inducer.
    pub fn new(config: SamplerConfig) -> Self {
        Self { config, gold: None }
    }

    /// Score checkpoints and the final assignment against gold tags.
    pub fn with_gold(mut self, gold: GoldStandard) -> Self {
        self.gold = Some(gold);
        self
    }

    /// Configuration.
    pub fn config(&self) -> &SamplerConfig {
        &self.config
    }

    /// Validate the inputs and draw the initial assignment.
    pub fn initialise<'a>(&'a self, features: &'a FeatureSet) -> Result<Chain<'a>> {
        self.config.validate()?;
        let k = self.config.n_classes;
        let n = features.num_types();

        let mut rng = match self.config.seed {
            Some(s) => StdRng::seed_from_u64(s),
            None => StdRng::from_rng(&mut rand::rng()),
        };
        let assignment: Vec<usize> = (0..n).map(|_| rng.random_range(0..k)).collect();
        let stats = SufficientStats::from_assignment(features, k, assignment)?;

        if let Some(gold) = &self.gold {
            let initial = gold.evaluate(stats.assignment())?;
            log::debug!(
                "initial M-1: {:.2}\tVM: {:.2}",
                initial.many_to_one,
                initial.v_measure
            );
        }

        log::debug!(
            "initialised {} word types into {} clusters over {} channel(s), {} iterations",
            n,
            k,
            features.channels().len(),
            self.config.iterations
        );

        Ok(Chain {
            features,
            config: &self.config,
            gold: self.gold.as_ref(),
            hyper: Hyperparameters::initial(&self.config, features),
            schedule: TemperatureSchedule::build(self.config.iterations, &self.config.anneal),
            sampler: CategoricalSampler::new(self.config.log_sampling),
            resampler: HyperResampler::from_config(&self.config),
            best_assignment: stats.assignment().to_vec(),
            best_log_posterior: f64::NEG_INFINITY,
            stats,
            rng,
            scores: Vec::with_capacity(k),
            iteration: 0,
            reports: Vec::new(),
        })
    }

    /// Initialise and run to completion, reporting through `observer`.
    pub fn run_with<O: SamplerObserver + ?Sized>(
        &self,
        features: &FeatureSet,
        observer: &mut O,
    ) -> Result<Outcome> {
        Ok(self.initialise(features)?.run(observer))
    }

    /// Initialise and run to completion, reporting through the `log` facade.
    pub fn run(&self, features: &FeatureSet) -> Result<Outcome> {
        self.run_with(features, &mut LogObserver)
    }
}

impl Clustering for TagInducer {
    fn fit_predict(&self, features: &FeatureSet) -> Result<Vec<usize>> {
        Ok(self.run(features)?.into_assignment())
    }

    fn n_clusters(&self) -> usize {
        self.config.n_classes
    }
}

/// A sampler bound to its feature set, between initialisation and completion.
///
/// The chain exclusively owns the sufficient statistics; nothing outside it
/// can mutate them.
#[derive(Debug)]
pub struct Chain<'a> {
    features: &'a FeatureSet,
    config: &'a SamplerConfig,
    gold: Option<&'a GoldStandard>,
    stats: SufficientStats,
    hyper: Hyperparameters,
    schedule: TemperatureSchedule,
    sampler: CategoricalSampler,
    resampler: HyperResampler,
    rng: StdRng,
    /// Per-cluster scores, reused across word types.
    scores: Vec<f64>,
    best_assignment: Vec<usize>,
    best_log_posterior: f64,
    /// Iterations completed.
    iteration: usize,
    reports: Vec<IterationReport>,
}

impl Chain<'_> {
    /// One Gibbs sweep over every word type at annealing factor `temperature`.
    pub fn sweep(&mut self, temperature: f64) {
        for t in 0..self.features.num_types() {
            let removed = self.stats.remove(self.features, t);
            score_clusters(self.features, &self.stats, &self.hyper, t, &mut self.scores);
            for s in &mut self.scores {
                *s *= temperature;
            }
            let cluster = self.sampler.draw(&self.scores, &mut self.rng);
            self.stats.add(self.features, removed, cluster);
        }
    }

    /// Run the next iteration: a sweep, then a checkpoint if the iteration
    /// is a multiple of `hyper_interval`.
    ///
    /// Returns the checkpoint report, if any. Does nothing once every
    /// iteration has run.
    pub fn step(&mut self) -> Option<IterationReport> {
        if self.is_finished() {
            return None;
        }
        self.iteration += 1;
        let temperature = self.schedule.get(self.iteration);
        self.sweep(temperature);

        if self.iteration % self.config.hyper_interval == 0 {
            let report = self.checkpoint(temperature);
            self.reports.push(report.clone());
            Some(report)
        } else {
            None
        }
    }

    fn checkpoint(&mut self, temperature: f64) -> IterationReport {
        let k = self.config.n_classes;
        let current = LogPosterior::compute(self.features, self.stats.assignment(), k, &self.hyper);
        let log_posterior = current.total();

        if log_posterior > self.best_log_posterior {
            log::debug!(
                "iter {}: best log posterior {} -> {}",
                self.iteration,
                self.best_log_posterior,
                log_posterior
            );
            self.best_log_posterior = log_posterior;
            self.best_assignment.copy_from_slice(self.stats.assignment());
        }

        let (_, acceptance) = self.resampler.resample(
            self.features,
            self.stats.assignment(),
            k,
            &mut self.hyper,
            current,
            temperature,
            &mut self.rng,
        );

        let evaluation = self
            .gold
            .and_then(|g| g.evaluate(self.stats.assignment()).ok());

        IterationReport {
            iteration: self.iteration,
            log_posterior,
            evaluation,
            temperature,
            class_hyper: self.hyper.class,
            feature_hypers: self.hyper.features.clone(),
            acceptance,
        }
    }

    /// Run every remaining iteration and finish.
    pub fn run<O: SamplerObserver + ?Sized>(mut self, observer: &mut O) -> Outcome {
        let total = self.schedule.len();
        while !self.is_finished() {
            let report = self.step();
            observer.on_iteration(self.iteration, total);
            if let Some(report) = report {
                observer.on_report(&report);
            }
        }
        self.finish()
    }

    /// Stop here and return the outcome, whether or not every iteration ran.
    pub fn finish(self) -> Outcome {
        let evaluation = self
            .gold
            .and_then(|g| g.evaluate(&self.best_assignment).ok());
        if let Some(e) = &evaluation {
            log::info!("M-1: {:.2}\tVM: {:.2}", e.many_to_one, e.v_measure);
        }
        Outcome {
            best_assignment: self.best_assignment,
            best_log_posterior: self.best_log_posterior,
            last_assignment: self.stats.assignment().to_vec(),
            hyperparameters: self.hyper,
            reports: self.reports,
            evaluation,
        }
    }

    /// Whether every scheduled iteration has run.
    pub fn is_finished(&self) -> bool {
        self.iteration >= self.schedule.len()
    }

    /// Iterations completed so far.
    pub fn iteration(&self) -> usize {
        self.iteration
    }

    /// Sufficient statistics of the current assignment.
    pub fn stats(&self) -> &SufficientStats {
        &self.stats
    }

    /// Current hyperparameters.
    pub fn hyperparameters(&self) -> &Hyperparameters {
        &self.hyper
    }

    /// Annealing schedule of this run.
    pub fn schedule(&self) -> &TemperatureSchedule {
        &self.schedule
    }

    /// Best assignment seen at a checkpoint (the initial one before any).
    pub fn best_assignment(&self) -> &[usize] {
        &self.best_assignment
    }

    /// Log posterior of [`best_assignment`](Self::best_assignment); `-∞`
    /// before the first checkpoint.
    pub fn best_log_posterior(&self) -> f64 {
        self.best_log_posterior
    }

    /// Log posterior of the current assignment under the current
    /// hyperparameters.
    pub fn log_posterior(&self) -> LogPosterior {
        LogPosterior::compute(
            self.features,
            self.stats.assignment(),
            self.config.n_classes,
            &self.hyper,
        )
    }

    /// Recount the statistics from scratch and compare.
    pub fn check_consistency(&self) -> Result<()> {
        self.stats.check_consistency(self.features)
    }
}

/// Result of a completed run.
#[derive(Debug, Clone)]
pub struct Outcome {
    best_assignment: Vec<usize>,
    best_log_posterior: f64,
    last_assignment: Vec<usize>,
    hyperparameters: Hyperparameters,
    reports: Vec<IterationReport>,
    evaluation: Option<Evaluation>,
}

impl Outcome {
    /// Best assignment found: the recommended output.
    pub fn assignment(&self) -> &[usize] {
        &self.best_assignment
    }

    /// Take the best assignment.
    pub fn into_assignment(self) -> Vec<usize> {
        self.best_assignment
    }

    /// Log posterior of [`assignment`](Self::assignment).
    pub fn best_log_posterior(&self) -> f64 {
        self.best_log_posterior
    }

    /// Assignment after the last sweep.
    pub fn last_assignment(&self) -> &[usize] {
        &self.last_assignment
    }

    /// Hyperparameters after the last resampling round.
    pub fn hyperparameters(&self) -> &Hyperparameters {
        &self.hyperparameters
    }

    /// Every checkpoint report, in order.
    pub fn reports(&self) -> &[IterationReport] {
        &self.reports
    }

    /// Scores of the best assignment, when gold tags were supplied.
    pub fn evaluation(&self) -> Option<&Evaluation> {
        self.evaluation.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{HyperShape, LogSampling, MhReference};
    use crate::features::Channel;
    use crate::sampler::observer::WriterObserver;
    use proptest::prelude::*;

    /// Two obvious groups of word types with disjoint context features.
    fn two_groups() -> FeatureSet {
        let mut rows = Vec::new();
        for i in 0..6 {
            rows.push(vec![5 + i % 2, 4, 0, 0, 1]);
        }
        for i in 0..6 {
            rows.push(vec![0, 0, 4 + i % 3, 5, 1]);
        }
        FeatureSet::new(vec![Channel::from_rows("context", &rows).unwrap()]).unwrap()
    }

    #[test]
    fn test_separates_obvious_groups() {
        let features = two_groups();
        let config = SamplerConfig::new(2).with_iterations(60).with_seed(42);
        let outcome = TagInducer::new(config).run_with(&features, &mut ()).unwrap();
        let z = outcome.assignment();
        assert!(z[..6].iter().all(|&c| c == z[0]));
        assert!(z[6..].iter().all(|&c| c == z[6]));
        assert_ne!(z[0], z[6]);
    }

    #[test]
    fn test_reports_every_interval() {
        let features = two_groups();
        let config = SamplerConfig::new(3).with_iterations(23).with_seed(1);
        let outcome = TagInducer::new(config).run_with(&features, &mut ()).unwrap();
        let iters: Vec<usize> = outcome.reports().iter().map(|r| r.iteration).collect();
        assert_eq!(iters, vec![5, 10, 15, 20]);
        assert!(outcome.best_log_posterior().is_finite());
    }

    #[test]
    fn test_no_checkpoint_keeps_initial_state() {
        let features = two_groups();
        let config = SamplerConfig::new(3).with_iterations(4).with_seed(1);
        let inducer = TagInducer::new(config);
        let chain = inducer.initialise(&features).unwrap();
        let initial = chain.best_assignment().to_vec();
        let outcome = chain.run(&mut ());
        assert_eq!(outcome.assignment(), initial.as_slice());
        assert_eq!(outcome.best_log_posterior(), f64::NEG_INFINITY);
        assert!(outcome.reports().is_empty());
    }

    #[test]
    fn test_step_stops_at_budget() {
        let features = two_groups();
        let inducer = TagInducer::new(SamplerConfig::new(2).with_iterations(5).with_seed(3));
        let mut chain = inducer.initialise(&features).unwrap();
        for _ in 0..4 {
            assert!(chain.step().is_none());
        }
        assert!(chain.step().is_some());
        assert!(chain.is_finished());
        assert!(chain.step().is_none());
        assert_eq!(chain.iteration(), 5);
    }

    #[test]
    fn test_k_larger_than_vocabulary() {
        let features = two_groups();
        let config = SamplerConfig::new(40).with_iterations(10).with_seed(9);
        let z = TagInducer::new(config).fit_predict(&features).unwrap();
        assert_eq!(z.len(), 12);
        assert!(z.iter().all(|&c| c < 40));
    }

    #[test]
    fn test_invalid_config_rejected_before_sampling() {
        let features = two_groups();
        let inducer = TagInducer::new(SamplerConfig::new(0));
        assert!(inducer.initialise(&features).is_err());
    }

    #[test]
    fn test_gold_mismatch_rejected() {
        let features = two_groups();
        // Token of word type 20 does not exist.
        let gold = GoldStandard::new(vec![0, 20], vec![0, 1]).unwrap();
        let inducer = TagInducer::new(SamplerConfig::new(2).with_seed(0)).with_gold(gold);
        assert!(inducer.initialise(&features).is_err());
    }

    #[test]
    fn test_gold_evaluation_reported() {
        let features = two_groups();
        let token_types: Vec<usize> = (0..12).collect();
        let tags: Vec<usize> = (0..12).map(|t| t / 6).collect();
        let gold = GoldStandard::new(token_types, tags).unwrap();
        let config = SamplerConfig::new(2).with_iterations(40).with_seed(42);
        let mut obs = WriterObserver::new(Vec::new());
        let outcome = TagInducer::new(config)
            .with_gold(gold)
            .run_with(&features, &mut obs)
            .unwrap();
        assert!(outcome.reports().iter().all(|r| r.evaluation.is_some()));
        let e = outcome.evaluation().unwrap();
        assert!((e.many_to_one - 100.0).abs() < 1e-9);

        let out = String::from_utf8(obs.finish().unwrap()).unwrap();
        let first = out.lines().next().unwrap();
        // iteration, logP, M-1, VM, temperature, hyperClass, one channel
        assert_eq!(first.split('\t').count(), 7);
    }

    #[test]
    fn test_untied_shapes_run() {
        let features = two_groups();
        for shape in [HyperShape::UntiedTwoWay, HyperShape::UntiedFull] {
            let config = SamplerConfig::new(2)
                .with_iterations(20)
                .with_seed(5)
                .with_hyper_shape(shape)
                .with_log_sampling(LogSampling::LogSumExp);
            let outcome = TagInducer::new(config).run_with(&features, &mut ()).unwrap();
            assert!(outcome.hyperparameters().is_valid());
            assert!(outcome.best_log_posterior().is_finite());
        }
    }

    #[test]
    fn test_both_mh_references_run() {
        let features = two_groups();
        for reference in [MhReference::Fixed, MhReference::Current] {
            let config = SamplerConfig::new(2)
                .with_iterations(20)
                .with_seed(8)
                .with_mh_reference(reference);
            let outcome = TagInducer::new(config).run_with(&features, &mut ()).unwrap();
            assert!(outcome.hyperparameters().is_valid());
            assert_eq!(outcome.reports().len(), 4);
        }
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(16))]

        #[test]
        fn sweeps_keep_stats_consistent(seed in any::<u64>(), k in 1usize..6) {
            let features = two_groups();
            let inducer = TagInducer::new(SamplerConfig::new(k).with_iterations(10).with_seed(seed));
            let mut chain = inducer.initialise(&features).unwrap();
            while !chain.is_finished() {
                chain.step();
                prop_assert!(chain.check_consistency().is_ok());
                prop_assert_eq!(chain.stats().types_per_class().iter().sum::<usize>(), 12);
                prop_assert!(chain.hyperparameters().is_valid());
            }
        }

        #[test]
        fn best_log_posterior_never_decreases(seed in any::<u64>()) {
            let features = two_groups();
            let inducer = TagInducer::new(SamplerConfig::new(3).with_iterations(30).with_seed(seed));
            let mut chain = inducer.initialise(&features).unwrap();
            let mut previous = chain.best_log_posterior();
            while !chain.is_finished() {
                chain.step();
                prop_assert!(chain.best_log_posterior() >= previous);
                previous = chain.best_log_posterior();
            }
        }
    }
}
