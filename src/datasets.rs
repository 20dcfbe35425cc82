use clap::ValueEnum;

use crate::pipeline::table::Selection;

/// The five VitiBrasil pages served by this tool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, ValueEnum)]
pub enum Dataset {
    Producao,
    Processamento,
    Comercializacao,
    Importacao,
    Exportacao,
}

impl Dataset {
    pub const ALL: [Dataset; 5] = [
        Dataset::Producao,
        Dataset::Processamento,
        Dataset::Comercializacao,
        Dataset::Importacao,
        Dataset::Exportacao,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Dataset::Producao => "producao",
            Dataset::Processamento => "processamento",
            Dataset::Comercializacao => "comercializacao",
            Dataset::Importacao => "importacao",
            Dataset::Exportacao => "exportacao",
        }
    }

    /// Value of the portal's `opcao` query parameter.
    pub fn option(self) -> &'static str {
        match self {
            Dataset::Producao => "opt_02",
            Dataset::Processamento => "opt_03",
            Dataset::Comercializacao => "opt_04",
            Dataset::Importacao => "opt_05",
            Dataset::Exportacao => "opt_06",
        }
    }

    pub fn selection(self) -> Selection {
        match self {
            Dataset::Producao | Dataset::Comercializacao => Selection::Index(0),
            Dataset::Processamento | Dataset::Importacao | Dataset::Exportacao => Selection::All,
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            Dataset::Producao => "Produção de vinhos, sucos e derivados",
            Dataset::Processamento => "Quantidade de uvas processadas",
            Dataset::Comercializacao => "Comercialização de vinhos e derivados",
            Dataset::Importacao => "Importação de derivados de uva",
            Dataset::Exportacao => "Exportação de derivados de uva",
        }
    }

    pub fn url(self, base_url: &str) -> String {
        let sep = if base_url.contains('?') { '&' } else { '?' };
        format!("{}{}opcao={}", base_url, sep, self.option())
    }
}
