pub mod assemble;
pub mod locate;
pub mod sanitize;
pub mod table;
pub mod typer;

use tracing::debug;

use crate::error::{ParseError, PipelineError};
use crate::fetch::Document;
use locate::{HtmlTableLocator, TableLocator};
use table::{DatasetResult, Payload, RawTable, Selection, TableResult};
use typer::ColumnTyper;

/// Document → tables → typed → sanitized → records.
pub struct Pipeline<L = HtmlTableLocator> {
    locator: L,
    typer: ColumnTyper,
}

impl Pipeline<HtmlTableLocator> {
    pub fn new(typer: ColumnTyper) -> Self {
        Self::with_locator(HtmlTableLocator, typer)
    }
}

impl<L: TableLocator> Pipeline<L> {
    pub fn with_locator(locator: L, typer: ColumnTyper) -> Self {
        Pipeline { locator, typer }
    }

    /// Every table in page order.
    pub fn process_all(&self, doc: &Document) -> Result<DatasetResult, PipelineError> {
        self.locator
            .locate(doc)?
            .into_iter()
            .map(|raw| self.convert(raw))
            .collect()
    }

    pub fn process(&self, doc: &Document, selection: Selection) -> Result<Payload, PipelineError> {
        match selection {
            Selection::All => self.process_all(doc).map(Payload::Tables),
            Selection::Index(index) => {
                let mut tables = self.locator.locate(doc)?;
                let found = tables.len();
                if index >= found {
                    return Err(ParseError::TableNotFound { index, found }.into());
                }
                self.convert(tables.swap_remove(index)).map(Payload::Single)
            }
        }
    }

    fn convert(&self, raw: RawTable) -> Result<TableResult, PipelineError> {
        debug!("Converting table: {} columns, {} rows", raw.width(), raw.rows.len());
        let typed = self.typer.type_table(raw)?;
        Ok(assemble::assemble(sanitize::sanitize(typed)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::Settings;
    use crate::testing::fixture;
    use serde_json::json;

    fn pipeline() -> Pipeline {
        Pipeline::new(ColumnTyper::from_settings(&Settings::default()).unwrap())
    }

    fn doc(html: &str) -> Document {
        Document::new("http://test/index.php", None, html)
    }

    const SCENARIO_A: &str = "<html><body><table>
        <thead><tr><th>Ano</th><th>Quantidade</th></tr></thead>
        <tbody><tr><td>2020</td><td>1.234,5</td></tr><tr><td>2021</td><td>—</td></tr></tbody>
        </table></body></html>";

    #[test]
    fn single_table_scenario() {
        let payload = pipeline().process(&doc(SCENARIO_A), Selection::All).unwrap();
        assert_eq!(
            serde_json::to_value(&payload).unwrap(),
            json!([{
                "records": [
                    {"Ano": "2020", "Quantidade": 1234.5},
                    {"Ano": "2021", "Quantidade": null}
                ],
                "features": ["Ano", "Quantidade"],
                "numeric_features": ["Quantidade"]
            }])
        );
    }

    #[test]
    fn zero_tables_is_an_empty_result() {
        let out = pipeline().process_all(&doc("<html><body><p>Nada</p></body></html>")).unwrap();
        assert!(out.is_empty());
    }

    #[test]
    fn two_tables_in_document_order() {
        let html = format!("{}{}", SCENARIO_A, "<table><tr><th>País</th></tr><tr><td>Chile</td></tr></table>");
        let out = pipeline().process_all(&doc(&html)).unwrap();
        assert_eq!(out.len(), 2);
        assert_eq!(out[0].features, vec!["Ano", "Quantidade"]);
        assert_eq!(out[1].features, vec!["País"]);
        assert!(out[1].numeric_features.is_empty());
    }

    #[test]
    fn index_selection() {
        let html = format!("{}{}", SCENARIO_A, "<table><tr><th>País</th></tr><tr><td>Chile</td></tr></table>");
        match pipeline().process(&doc(&html), Selection::Index(1)).unwrap() {
            Payload::Single(t) => assert_eq!(t.features, vec!["País"]),
            other => panic!("expected one table, got {:?}", other),
        }
    }

    #[test]
    fn index_past_the_end() {
        let err = pipeline().process(&doc(SCENARIO_A), Selection::Index(3)).unwrap_err();
        assert!(matches!(
            err,
            PipelineError::Parse(ParseError::TableNotFound { index: 3, found: 1 })
        ));
    }

    #[test]
    fn same_bytes_same_output() {
        let d = Document::new("http://test/", None, fixture("processamento"));
        let p = pipeline();
        let first = serde_json::to_vec(&p.process_all(&d).unwrap()).unwrap();
        let second = serde_json::to_vec(&p.process_all(&d).unwrap()).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn json_round_trip() {
        let d = Document::new("http://test/", None, fixture("processamento"));
        let result = pipeline().process_all(&d).unwrap();
        let text = serde_json::to_string(&result).unwrap();
        let back: DatasetResult = serde_json::from_str(&text).unwrap();
        assert_eq!(back, result);
    }

    #[test]
    fn features_match_column_count() {
        let d = Document::new("http://test/", None, fixture("processamento"));
        for table in pipeline().process_all(&d).unwrap() {
            for record in &table.records {
                assert_eq!(record.len(), table.features.len());
            }
            let mut features = table.features.iter();
            assert!(table.numeric_features.iter().all(|n| features.any(|f| f == n)));
        }
    }

    #[test]
    fn processamento_fixture() {
        let d = Document::new("http://test/", None, fixture("processamento"));
        let out = pipeline().process_all(&d).unwrap();

        // the outer layout table has no header row and is skipped
        assert_eq!(out.len(), 2);
        assert_eq!(out[0].features, vec!["Cultivar", "Quantidade (Kg)"]);
        assert_eq!(out[0].numeric_features, vec!["Quantidade (Kg)"]);
        assert_eq!(out[0].records[0]["Cultivar"], json!("TINTAS"));
        assert_eq!(out[0].records[0]["Quantidade (Kg)"], json!(35881118.0));
        assert_eq!(out[0].records[2]["Quantidade (Kg)"], json!(null));
        assert_eq!(out[1].features, vec!["Cultivar", "Quantidade (Kg)"]);
        assert_eq!(out[1].records.last().unwrap()["Cultivar"], json!("Total"));
    }

    #[test]
    fn producao_fixture_first_table() {
        let d = Document::new("http://test/", Some("utf-8".into()), fixture("producao"));
        let Payload::Single(t) = pipeline().process(&d, Selection::Index(0)).unwrap() else {
            panic!("expected a single table");
        };
        assert_eq!(t.features, vec!["Produto", "Quantidade (L.)"]);
        assert_eq!(t.records.len(), 4);
        assert_eq!(t.records[0]["Produto"], json!("VINHO DE MESA"));
        assert_eq!(t.records[0]["Quantidade (L.)"], json!(169762429.0));
        assert_eq!(t.records[3]["Produto"], json!("Total"));
    }

    /// Fixed tables, no HTML involved.
    struct StubLocator(Vec<RawTable>);

    impl TableLocator for StubLocator {
        fn locate(&self, _: &Document) -> Result<Vec<RawTable>, ParseError> {
            Ok(self.0.clone())
        }
    }

    #[test]
    fn custom_locator() {
        let raw = RawTable {
            header: vec!["Ano".into(), "Valor".into()],
            rows: vec![vec!["2022".into(), "".into()]],
        };
        let p = Pipeline::with_locator(
            StubLocator(vec![raw]),
            ColumnTyper::from_settings(&Settings::default()).unwrap(),
        );
        let out = p.process_all(&doc("")).unwrap();
        assert_eq!(
            serde_json::to_value(&out[0].records).unwrap(),
            json!([{"Ano": "2022", "Valor": null}])
        );
    }
}
