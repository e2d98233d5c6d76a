use crate::error::LedgerError;
use crate::product::Product;
use crate::reconcile::reconcile;
use crate::reconcile::ColumnPolicy;
use crate::reconcile::ProductTable;
use crate::reconcile::Reconciliation;
use crate::record::RecordBatch;
use crate::spreadsheet::CellValue;
use crate::spreadsheet::TableLocation;
use crate::spreadsheet::TableStore;
use tracing::debug;
use tracing::info;

/// Reads a product's table: the table named like the product in the sheet named
/// like the product, else that sheet's first table.
///
/// # Returns
/// Where the table was found and its header and rows.
pub fn load_product_table<S: TableStore>(store: &S, product: Product) -> Result<(TableLocation, ProductTable), LedgerError> {
    let location = store.locate_table(product.as_str(), product.as_str())?;
    let mut rows = store.read_range(&location.sheet, &location.range)?.into_iter();
    let columns = rows
        .next()
        .unwrap_or_default()
        .iter()
        .map(|value| value.to_string().trim().to_owned())
        .collect();
    let table = ProductTable {
        product,
        columns,
        rows: rows.collect(),
        range: location.range,
    };
    debug!(%product, table = %location.table, range = %location.range, rows = table.rows.len(), "loaded table");
    Ok((location, table))
}

/// Writes a table back over its previous location.
///
/// The whole previous range is cleared first, so rows beyond the new extent do not
/// survive a shrink. Header and rows are then written from the range's top-left
/// cell and the table is resized to `table.range`.
pub fn write_product_table<S: TableStore>(store: &mut S, location: &TableLocation, table: &ProductTable) -> Result<(), LedgerError> {
    store.clear_range(&location.sheet, &location.range)?;

    let header = table.columns.iter().map(|name| CellValue::from(name.as_str())).collect::<Vec<_>>();
    let rows = std::iter::once(&header).chain(table.rows.iter());
    for (offset, values) in rows.enumerate() {
        let row = table.range.min_row + offset;
        for (index, value) in values.iter().enumerate() {
            if !matches!(value, CellValue::Empty) {
                store.set_cell(&location.sheet, row, table.range.min_col + index, value.clone())?;
            }
        }
    }
    store.set_table_range(&location.sheet, &location.table, table.range)?;
    Ok(())
}

/// Loads a product's table, merges the batches and writes the result back when a
/// batch was admitted. Nothing is persisted until the store is saved.
pub fn update_product_table<S: TableStore>(
    store: &mut S,
    product: Product,
    batches: &[RecordBatch],
    policy: ColumnPolicy,
) -> Result<Reconciliation, LedgerError> {
    let (location, table) = load_product_table(store, product)?;
    let reconciliation = reconcile(&table, batches, policy)?;
    if reconciliation.changed() {
        write_product_table(store, &location, &reconciliation.table)?;
        info!(
            %product,
            added = reconciliation.admitted.len(),
            rows = reconciliation.rows_after,
            range = %reconciliation.table.range,
            "table updated"
        );
    } else {
        debug!(%product, "no new dates");
    }
    Ok(reconciliation)
}
