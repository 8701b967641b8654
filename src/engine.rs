/// Workload model builder facade
///
/// Owns the template registry and the parsed trace, groups it into
/// transactions and clusters, and drives the two trainers. Hosts that only
/// need one piece (say, graph training over a raw stream) can use the
/// builder and model types directly.
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use anyhow::{Context, Result};
use serde::Serialize;

use crate::builder::graph_builder::GraphModelBuilder;
use crate::builder::tree_builder::TreeModelBuilder;
use crate::config::BuilderConfig;
use crate::model::graph::GraphModel;
use crate::model::tree::TreeModel;
use crate::predict::graph::GraphPredictor;
use crate::predict::tree::TreePredictor;
use crate::trace::parser::StatementParser;
use crate::trace::registry::TemplateRegistry;
use crate::trace::statement::Statement;
use crate::trace::transaction::{cluster_transactions, split_transactions, Cluster, Transaction};

pub struct ModelBuilder {
    config: BuilderConfig,
    registry: TemplateRegistry,
    statements: Vec<Statement>,
    transactions: Vec<Transaction>,
    clusters: Vec<Cluster>,
    skipped_lines: u64,
}

impl ModelBuilder {
    /// Parse a trace file, one JSON object per line.
    pub fn from_trace_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path)
            .with_context(|| format!("opening trace file {}", path.display()))?;
        let reader = BufReader::new(file);
        let mut lines = Vec::new();
        for line in reader.lines() {
            lines.push(line.context("reading trace line")?);
        }
        Ok(Self::from_lines(
            lines.iter().map(String::as_str),
            BuilderConfig::default(),
        ))
    }

    /// Parse an in-memory trace.
    pub fn from_trace_str(content: &str) -> Self {
        Self::from_lines(content.lines(), BuilderConfig::default())
    }

    pub fn with_config(mut self, config: BuilderConfig) -> Self {
        self.config = config;
        self
    }

    fn from_lines<'a>(lines: impl Iterator<Item = &'a str>, config: BuilderConfig) -> Self {
        let parser = StatementParser::new();
        let mut registry = TemplateRegistry::new();
        let mut statements = Vec::new();
        let mut skipped_lines = 0u64;
        for line in lines {
            if line.trim().len() <= 1 {
                continue;
            }
            match parser.parse_line(&mut registry, line) {
                Ok(statement) => statements.push(statement),
                Err(err) => {
                    skipped_lines += 1;
                    tracing::warn!(%err, "skipping unparseable trace line");
                }
            }
        }
        let transactions = split_transactions(&registry, &statements);
        let clusters = cluster_transactions(transactions.clone());
        tracing::info!(
            statements = statements.len(),
            templates = registry.len(),
            transactions = transactions.len(),
            clusters = clusters.len(),
            skipped = skipped_lines,
            "trace parsed"
        );
        Self {
            config,
            registry,
            statements,
            transactions,
            clusters,
            skipped_lines,
        }
    }

    pub fn registry(&self) -> &TemplateRegistry {
        &self.registry
    }

    pub fn statements(&self) -> &[Statement] {
        &self.statements
    }

    pub fn transactions(&self) -> &[Transaction] {
        &self.transactions
    }

    pub fn clusters(&self) -> &[Cluster] {
        &self.clusters
    }

    pub fn skipped_lines(&self) -> u64 {
        self.skipped_lines
    }

    /// Train a prediction tree per cluster over the whole trace.
    pub fn build_tree_model(&self) -> TreeModel {
        let mut model = TreeModel::new();
        let mut trainer = TreeModelBuilder::new(self.config.clone());
        for cluster in &self.clusters {
            trainer.train_cluster(&mut model, cluster);
        }
        tracing::info!(
            trees = model.len(),
            cap_triggers = trainer.cap_triggers(),
            "tree model trained"
        );
        model
    }

    /// Train the graph model over the statement stream, optionally only
    /// its leading `limit` statements.
    pub fn build_graph_model(&self, limit: Option<usize>) -> GraphModel {
        let mut model = GraphModel::new();
        let mut trainer = GraphModelBuilder::new(self.config.clone());
        trainer.train(&mut model, &self.statements, limit);
        model
    }

    pub fn tree_predictor<'a>(&'a self, model: &'a TreeModel) -> TreePredictor<'a> {
        TreePredictor::new(model, &self.registry)
    }

    pub fn graph_predictor<'a>(&'a self, model: &'a GraphModel) -> GraphPredictor<'a> {
        GraphPredictor::new(model, &self.registry)
    }

    /// Train on the leading fraction of each eligible cluster and replay
    /// the remainder against the tree predictor, counting outcomes.
    pub fn evaluate_tree_model(&self) -> EvaluationReport {
        let mut model = TreeModel::new();
        let mut trainer = TreeModelBuilder::new(self.config.clone());
        for cluster in self.eligible_clusters() {
            let train_count = self.train_count(cluster);
            trainer.train_cluster(&mut model, &cluster[..train_count]);
        }

        let mut report = EvaluationReport::default();
        let mut predictor = TreePredictor::new(&model, &self.registry);
        for cluster in self.eligible_clusters() {
            report.clusters_evaluated += 1;
            let train_count = self.train_count(cluster);
            for transaction in &cluster[train_count..] {
                let first = match transaction.first() {
                    Some(first) => first,
                    None => continue,
                };
                report.transactions += 1;
                report.observe_statement(first);
                predictor.move_to_next(first);
                for statement in &transaction[1..] {
                    report.observe_statement(statement);
                    match predictor.predict_next() {
                        Some(predicted) if predicted.same(statement) => report.hits += 1,
                        Some(_) => report.wrong_predictions += 1,
                        None => report.unpredictable += 1,
                    }
                    predictor.move_to_next(statement);
                }
                predictor.end_transaction();
            }
        }
        tracing::info!(
            hits = report.hits,
            wrong = report.wrong_predictions,
            unpredictable = report.unpredictable,
            statements = report.total_statements,
            selects = report.total_selects,
            transactions = report.transactions,
            "tree model evaluated"
        );
        report
    }

    fn eligible_clusters(&self) -> impl Iterator<Item = &Cluster> {
        let min_len = self.config.min_transaction_len;
        let fraction = self.config.training_fraction;
        self.clusters.iter().filter(move |cluster| {
            cluster[0].len() >= min_len && (cluster.len() as f64 * fraction) as usize > 1
        })
    }

    fn train_count(&self, cluster: &Cluster) -> usize {
        (cluster.len() as f64 * self.config.training_fraction) as usize
    }
}

/// Outcome counts from replaying held-out transactions
#[derive(Clone, Debug, Default, Serialize)]
pub struct EvaluationReport {
    pub total_statements: u64,
    pub total_selects: u64,
    pub hits: u64,
    pub wrong_predictions: u64,
    pub unpredictable: u64,
    pub transactions: u64,
    pub clusters_evaluated: u64,
}

impl EvaluationReport {
    fn observe_statement(&mut self, statement: &Statement) {
        self.total_statements += 1;
        if statement.is_select {
            self.total_selects += 1;
        }
    }

    /// Fraction of attempted statements predicted exactly.
    pub fn hit_rate(&self) -> f64 {
        let attempted = self.hits + self.wrong_predictions + self.unpredictable;
        if attempted == 0 {
            return 0.0;
        }
        self.hits as f64 / attempted as f64
    }
}
