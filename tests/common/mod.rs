// Shared fixture for the integration tests
#![allow(dead_code)]

use egressos_explorer::config::AnalysisConfig;
use std::fs;
use tempfile::TempDir;

/// Ten rows: two dual-level students, one foreign program, one `n/r` status.
pub const EGRESSOS_CSV: &str = "\
Programa,Registro,Nome,Adm,Sit,Nascimento,Nivel,Sexo
PGCAP,0001,Ana,2010-03-01,2012-03-01,1985-06-15,MESTRADO,Feminino
PGCAP,0002,Ana,2012-08-01,2016-08-01,1985-06-15,DOUTORADO,Feminino
ECOLOGIA,0003,Bruno,2015-03-01,2017-04-01,1990-01-10,MESTRADO,Masculino
ECO-ADM,0004,Carla,2001-03-01,2005-05-01,1975-02-20,DOUTORADO,Feminino
FISICA,0005,Diego,2010-03-01,2012-03-01,1980-01-01,MESTRADO,Masculino
PGCAP,0006,Elisa,2018-03-01,n/r,1992-04-04,MESTRADO,Feminino
ECO,0007,Fabio,1995-03-01,1997-09-01,1970-07-07,MESTRADO,Masculino
ECOLOGIA,0008,Fabio,1998-03-01,2002-03-01,1970-07-07,DOUTORADO,Masculino
PGCAP,0009,Gabi,2016-03-01,2018-03-01,1994-09-09,MESTRADO,Feminino
PGCAP,0010,Hugo,2014-03-01,2018-03-01,1988-11-11,DOUTORADO,Masculino
";

/// Master's graduates only, nobody with a second level.
pub const MASTERS_ONLY_CSV: &str = "\
Programa,Registro,Nome,Adm,Sit,Nascimento,Nivel,Sexo
PGCAP,0001,Ana,2010-03-01,2012-03-01,1985-06-15,MESTRADO,Feminino
ECOLOGIA,0003,Bruno,2015-03-01,2017-04-01,1990-01-10,MESTRADO,Masculino
PGCAP,0009,Gabi,2016-03-01,2018-03-01,1994-09-09,MESTRADO,Feminino
";

/// Write `csv` into a temp dir and point a default config at it.
pub fn setup(csv: &str) -> (TempDir, AnalysisConfig) {
    let dir = TempDir::new().unwrap();
    let input = dir.path().join("egressos.csv");
    fs::write(&input, csv).unwrap();

    let mut config = AnalysisConfig::default();
    config.input.path = input;
    config.output.dual_level_csv = dir.path().join("out").join("DoisNiveis.csv");
    config.output.chart_dir = dir.path().join("charts");
    (dir, config)
}
