use anyhow::Result;
use tabular_classifier::classifier::ClassifierSession;
use tabular_classifier::data_handling::{FeatureTable, Value};

/// Synthetic two-class table: `dose` separates "responder" from
/// "non_responder", `site` is a three-level categorical column.
fn synthetic_table(n: usize, offset: usize) -> Result<FeatureTable> {
    let sites = ["north", "south", "east"];
    let mut site = Vec::with_capacity(n);
    let mut dose = Vec::with_capacity(n);
    let mut outcome = Vec::with_capacity(n);
    for i in 0..n {
        let responder = i % 2 == 0;
        let jitter = ((i * 7 + offset) % 13) as f64 * 0.1;
        site.push(Value::from(sites[(i / 2) % 3]));
        dose.push(Value::from(if responder { 3.0 + jitter } else { 1.0 - jitter }));
        outcome.push(Value::from(if responder { "responder" } else { "non_responder" }));
    }
    Ok(FeatureTable::from_columns(vec![
        ("site", site),
        ("dose", dose),
        ("outcome", outcome),
    ])?)
}

fn main() -> Result<()> {
    env_logger::init();

    let train = synthetic_table(100, 0)?;
    let test = synthetic_table(40, 5)?;
    let validation = synthetic_table(30, 11)?;

    println!(
        "Synthetic tables: train {} rows, test {} rows, validation {} rows",
        train.nrows(),
        test.nrows(),
        validation.nrows()
    );

    let mut session = ClassifierSession::new("synthetic.csv", "outcome", &train, &test, &validation)?;
    let results = session.classify(&["site", "dose"])?;

    println!(
        "Accuracy train={} test={} validation={} (train+test {:.4})",
        results.accuracy_train, results.accuracy, results.accuracy_validation, results.accuracy_traintest
    );
    println!("Precision={:.3} Recall={:.3}", results.precision, results.recall);
    println!("Confusion matrix labels: {:?}", results.confusion_labels);
    println!("{:?}", results.confusion_matrix.counts());
    println!("Normalized:\n{:.3}", results.cm_normalized);

    for (label, auc) in results.auc() {
        println!("AUC for class '{}': {:.4}", label, auc);
    }
    if let Some(curve) = results.roc_curve(&Value::from("responder")) {
        println!("ROC points for 'responder': {:?}", curve.pairs());
    }

    let averages = session.set_average_scores(&[1.0, 0.95], &[1.0, 1.0], &[1.0, 0.9], &[1.0, 0.92])?;
    println!("Averaged over two runs: {:?}", averages);

    Ok(())
}
