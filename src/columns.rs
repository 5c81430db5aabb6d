//! Join column discovery.
//!
//! Lists the columns present in both inputs, in left-header order, followed
//! by the composite key (`A|B`) when both of its columns are shared.

use anyhow::Result;
use log::info;

use crate::{
    cli::ColumnsArgs,
    dataset::Dataset,
    normalize::KeySpec,
    table, workbook,
};

pub fn join_candidates(
    left: &Dataset,
    right: &Dataset,
    composite: Option<(&str, &str)>,
) -> Vec<String> {
    let mut candidates = left
        .headers
        .iter()
        .filter(|name| right.has_column(name))
        .fold(Vec::<String>::new(), |mut acc, name| {
            if !acc.contains(name) {
                acc.push(name.clone());
            }
            acc
        });
    if let Some((first, second)) = composite {
        let spec = KeySpec::composite(first, second);
        let shared = spec
            .columns()
            .iter()
            .all(|column| left.has_column(column) && right.has_column(column));
        if shared {
            candidates.push(spec.to_string());
        }
    }
    candidates
}

pub fn execute(args: &ColumnsArgs) -> Result<()> {
    let (left, right) = workbook::load_pair(&args.inputs)?;
    let composite = args
        .composite
        .as_ref()
        .map(|(first, second)| (first.as_str(), second.as_str()));
    let candidates = join_candidates(&left, &right, composite);

    if candidates.is_empty() {
        info!(
            "No shared columns between '{}' and '{}'",
            left.name, right.name
        );
        return Ok(());
    }

    let rows = candidates
        .iter()
        .enumerate()
        .map(|(idx, name)| vec![(idx + 1).to_string(), name.clone()])
        .collect::<Vec<_>>();
    let headers = vec!["#".to_string(), "column".to_string()];
    table::print_table(&headers, &rows);
    info!(
        "Listed {} join column candidate(s) shared by '{}' and '{}'",
        candidates.len(),
        left.name,
        right.name
    );
    Ok(())
}
