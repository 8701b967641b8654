/// Transaction grouping
///
/// The trainers do not consume the raw statement stream directly. The tree
/// trainer wants clusters: sets of transactions that issue the exact same
/// template sequence. This module splits the stream at `BEGIN`/`COMMIT`
/// delimiters and groups the resulting transactions by their template-id
/// sequence.
use fxhash::FxHashMap;

use crate::trace::registry::TemplateRegistry;
use crate::trace::statement::Statement;

/// An ordered run of statements between transaction delimiters
pub type Transaction = Vec<Statement>;

/// Transactions sharing one template-id sequence
pub type Cluster = Vec<Transaction>;

const BEGIN: &str = "BEGIN";
const COMMIT: &str = "COMMIT";

/// True if the statement is a transaction delimiter. Delimiters carry no
/// placeholders, so the interned template is the literal SQL.
pub fn is_delimiter(registry: &TemplateRegistry, statement: &Statement) -> bool {
    let template = registry.template(statement.template_id);
    template == BEGIN || template == COMMIT
}

/// Split a statement stream into transactions at `BEGIN`/`COMMIT`.
/// Delimiter statements are dropped. A trailing run without a closing
/// `COMMIT` is still flushed if non-empty.
pub fn split_transactions(
    registry: &TemplateRegistry,
    statements: &[Statement],
) -> Vec<Transaction> {
    let mut transactions = Vec::new();
    let mut current: Transaction = Vec::new();
    for statement in statements {
        if is_delimiter(registry, statement) {
            if !current.is_empty() {
                transactions.push(std::mem::take(&mut current));
            }
        } else {
            current.push(statement.clone());
        }
    }
    if !current.is_empty() {
        transactions.push(current);
    }
    transactions
}

/// Group transactions by template-id sequence, preserving first-seen
/// cluster order.
pub fn cluster_transactions(transactions: Vec<Transaction>) -> Vec<Cluster> {
    let mut index: FxHashMap<Vec<u32>, usize> = FxHashMap::default();
    let mut clusters: Vec<Cluster> = Vec::new();
    for transaction in transactions {
        let key: Vec<u32> = transaction.iter().map(|s| s.template_id).collect();
        match index.get(&key) {
            Some(&i) => clusters[i].push(transaction),
            None => {
                index.insert(key, clusters.len());
                clusters.push(vec![transaction]);
            }
        }
    }
    clusters
}
