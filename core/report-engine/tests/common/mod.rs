//! FILENAME: tests/common/mod.rs
//! Fixtures shared by the report-engine integration tests.

#![allow(dead_code)]

use std::io::Write;
use std::path::PathBuf;

use engine::{Column, ColumnType, Table};
use persistence::{load_csv_reader, SourceSpec};
use report_engine::SourceSet;
use tempfile::TempDir;

/// Coffee shop transactions. 2023-01-01 is a Sunday.
pub struct CoffeeSalesFixture;

impl CoffeeSalesFixture {
    pub const CSV: &'static str = "\
transaction_id,transaction_date,transaction_time,transaction_qty,store_location,unit_price,\
product_category,product_detail
1,2023-01-01,07:06:11,2,Lower Manhattan,3.0,Coffee,Ethiopia Rg
2,2023-01-01,07:08:56,2,Lower Manhattan,3.25,Tea,Spicy Eye Opener Chai Lg
3,2023-01-01,08:14:04,1,Hell's Kitchen,4.5,Drinking Chocolate,Dark chocolate Lg
4,2023-01-02,08:20:24,1,Astoria,2.0,Coffee,Our Old Time Diner Blend Sm
5,2023-01-02,09:22:41,3,Astoria,3.25,Tea,Spicy Eye Opener Chai Lg
6,2023-01-03,09:25:10,1,Hell's Kitchen,3.0,Coffee,Ethiopia Rg
7,2023-01-03,10:00:00,2,Lower Manhattan,4.5,Drinking Chocolate,Dark chocolate Lg
8,2023-01-04,10:30:00,1,Astoria,3.0,Coffee,Ethiopia Rg
";

    pub fn spec(path: impl Into<PathBuf>) -> SourceSpec {
        SourceSpec::new("sales", path)
            .with_column("transaction_date", ColumnType::Timestamp)
            .with_column("transaction_time", ColumnType::Timestamp)
            .with_column("transaction_qty", ColumnType::Numeric)
            .with_column("unit_price", ColumnType::Numeric)
            .with_column("store_location", ColumnType::Categorical)
    }

    pub fn table() -> Table {
        let spec = Self::spec("coffee_sales.csv");
        load_csv_reader(Self::CSV.as_bytes(), &spec).unwrap()
    }
}

/// Daily COVID-19 case counts for a handful of Indonesian provinces.
pub struct CovidFixture;

impl CovidFixture {
    pub const CSV: &'static str = "\
Date,Location,Island,New Cases,Total Cases,Latitude,Longitude,Population Density
2021-05-01,DKI Jakarta,Java,20,400,-6.2,106.8,16000
2021-05-01,Jawa Barat,Java,12,300,-6.9,107.6,1400
2021-05-01,Aceh,Sumatra,30,100,4.7,96.7,90
2021-05-03,DKI Jakarta,Java,12,412,-6.2,106.8,16000
2021-05-03,Jawa Barat,Java,8,308,-6.9,107.6,1400
2021-05-03,Aceh,Sumatra,18,118,4.7,96.7,90
";

    pub fn spec(path: impl Into<PathBuf>) -> SourceSpec {
        SourceSpec::new("cases", path)
            .with_column("date", ColumnType::Timestamp)
            .with_column("new_cases", ColumnType::Numeric)
            .normalized()
    }

    pub fn table() -> Table {
        let spec = Self::spec("covid_indonesia.csv");
        load_csv_reader(Self::CSV.as_bytes(), &spec).unwrap()
    }

    /// Island -> province leaves summing to 100.
    pub fn share_table() -> Table {
        Table::new(vec![
            Column::text("island", ["Java", "Java", "Sumatra"]),
            Column::text("province", ["DKI", "West", "Aceh"]),
            Column::numeric("cases", [32.0, 20.0, 48.0]),
        ])
        .unwrap()
    }
}

/// Source files written to a temporary directory.
pub struct TestHarness {
    pub dir: TempDir,
}

impl TestHarness {
    pub fn new() -> Self {
        TestHarness {
            dir: tempfile::tempdir().unwrap(),
        }
    }

    /// Writes `contents` to `name` inside the harness directory.
    pub fn write_file(&self, name: &str, contents: &str) -> PathBuf {
        let path = self.dir.path().join(name);
        let mut file = std::fs::File::create(&path).unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        path
    }

    pub fn with_fixtures() -> (Self, PathBuf, PathBuf) {
        let harness = Self::new();
        let sales = harness.write_file("coffee_sales.csv", CoffeeSalesFixture::CSV);
        let cases = harness.write_file("covid_indonesia.csv", CovidFixture::CSV);
        (harness, sales, cases)
    }
}

pub fn sources() -> SourceSet {
    SourceSet::new()
        .with_table("sales", CoffeeSalesFixture::table())
        .with_table("cases", CovidFixture::table())
}

pub fn approx_eq(a: f64, b: f64) -> bool {
    (a - b).abs() < 1e-9
}
