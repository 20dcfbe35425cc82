use super::table::{Cell, TypedTable};

/// Replace NaN and infinities with `Null` so the table has a strict JSON
/// encoding.
pub fn sanitize(mut table: TypedTable) -> TypedTable {
    for cell in table.rows.iter_mut().flatten() {
        if matches!(cell, Cell::Number(n) if !n.is_finite()) {
            *cell = Cell::Null;
        }
    }
    table
}
