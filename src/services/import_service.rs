//! Importación masiva de inventario
//!
//! Este módulo convierte un archivo (CSV, XLSX o texto extraído de un PDF)
//! en filas normalizadas, valida cada fila, descarta VINs duplicados y
//! entrega el subconjunto válido para la inserción masiva.

use std::collections::{HashMap, HashSet};
use std::io::Cursor;

use base64::{engine::general_purpose::STANDARD, Engine as _};
use calamine::{open_workbook_from_rs, Data, Reader, Xlsx};
use chrono::{Duration, NaiveDate};
use lazy_static::lazy_static;
use regex::Regex;
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::dto::vehicle_dto::{ImportFormat, ImportReport, ImportVehiclesRequest};
use crate::models::vehicle::{NewVehicle, VehicleStatus};
use crate::repositories::{VehicleRepository, VinIndex};
use crate::utils::{
    errors::AppError,
    validation::{normalize_vin, VIN_LENGTH},
};

/// Campos canónicos y los encabezados que se aceptan para cada uno
const FIELD_ALIASES: &[(&str, &[&str])] = &[
    ("vin", &["vin", "vin_number", "vehicle_vin"]),
    ("year", &["year", "model_year", "yr"]),
    ("make", &["make", "manufacturer", "brand"]),
    ("model", &["model", "model_name"]),
    ("trim", &["trim", "trim_level"]),
    ("color", &["color", "exterior_color", "colour"]),
    ("odometer", &["mileage", "odometer", "miles"]),
    ("bought_price", &["bought_price", "purchase_price", "price", "cost"]),
    ("buy_fee", &["buy_fee", "fee", "fees"]),
    ("purchase_date", &["purchase_date", "date_purchased", "bought_date"]),
    ("seller_name", &["seller", "seller_name"]),
    ("location", &["location", "lot"]),
    ("lot_number", &["lot_number", "stock_number", "stock"]),
    ("title_status", &["title_status", "title"]),
];

const REQUIRED_FIELDS: [&str; 4] = ["vin", "year", "make", "model"];

lazy_static! {
    static ref PDF_VIN: Regex = Regex::new(r"\b[A-HJ-NPR-Z0-9]{17}\b").expect("valid VIN regex");
    static ref PDF_YEAR_MAKE_MODEL: Regex =
        Regex::new(r"\b((?:19|20)\d{2})\s+([A-Za-z][\w-]*)\s+([A-Za-z0-9][\w-]*)").expect("valid year/make/model regex");
    static ref PDF_PRICE: Regex = Regex::new(r"\$\s*([0-9][0-9,]*(?:\.[0-9]{1,2})?)").expect("valid price regex");
}

/// Fila del archivo con sus campos ya mapeados a nombres canónicos
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawRow {
    /// Número de fila tal como lo ve el usuario en el archivo
    pub row_number: usize,
    pub fields: HashMap<&'static str, String>,
}

impl RawRow {
    fn get(&self, field: &str) -> Option<&str> {
        self.fields.get(field).map(|v| v.trim()).filter(|v| !v.is_empty())
    }
}

/// Nombre canónico para un encabezado (sin distinguir mayúsculas ni espacios)
pub fn canonical_field(header: &str) -> Option<&'static str> {
    let normalized = header
        .trim()
        .to_lowercase()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join("_")
        .replace('-', "_");

    FIELD_ALIASES
        .iter()
        .find(|(_, aliases)| aliases.contains(&normalized.as_str()))
        .map(|(field, _)| *field)
}

fn rows_from_table(headers: &[String], records: impl Iterator<Item = Vec<String>>) -> Vec<RawRow> {
    let columns: Vec<Option<&'static str>> = headers.iter().map(|h| canonical_field(h)).collect();

    records
        .enumerate()
        .filter(|(_, values)| values.iter().any(|v| !v.trim().is_empty()))
        .map(|(index, values)| {
            let mut fields = HashMap::new();
            for (column, value) in columns.iter().zip(values) {
                if let Some(field) = column {
                    fields.entry(*field).or_insert(value);
                }
            }
            RawRow {
                // +1 por el encabezado, +1 por base 1
                row_number: index + 2,
                fields,
            }
        })
        .collect()
}

pub fn parse_csv(content: &str) -> Result<Vec<RawRow>, AppError> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(content.as_bytes());

    let headers: Vec<String> = reader
        .headers()
        .map_err(|e| AppError::BadRequest(format!("Invalid CSV header: {}", e)))?
        .iter()
        .map(str::to_string)
        .collect();

    let mut records = Vec::new();
    for record in reader.records() {
        let record = record.map_err(|e| AppError::BadRequest(format!("Invalid CSV content: {}", e)))?;
        records.push(record.iter().map(str::to_string).collect::<Vec<_>>());
    }

    Ok(rows_from_table(&headers, records.into_iter()))
}

fn cell_to_string(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        Data::String(s) => s.clone(),
        Data::Float(f) if f.fract() == 0.0 => format!("{}", *f as i64),
        Data::Float(f) => f.to_string(),
        Data::Int(i) => i.to_string(),
        other => other.to_string(),
    }
}

/// Primera hoja del libro; `content` viene en base64
pub fn parse_xlsx(content_base64: &str) -> Result<Vec<RawRow>, AppError> {
    let bytes = STANDARD
        .decode(content_base64.trim())
        .map_err(|_| AppError::BadRequest("Spreadsheet content is not valid base64".to_string()))?;

    let mut workbook: Xlsx<_> = open_workbook_from_rs(Cursor::new(bytes))
        .map_err(|e| AppError::BadRequest(format!("Invalid spreadsheet: {}", e)))?;

    let range = workbook
        .worksheet_range_at(0)
        .ok_or_else(|| AppError::BadRequest("Spreadsheet has no worksheets".to_string()))?
        .map_err(|e| AppError::BadRequest(format!("Invalid worksheet: {}", e)))?;

    let mut rows = range.rows();
    let Some(header_row) = rows.next() else {
        return Ok(Vec::new());
    };
    let headers: Vec<String> = header_row.iter().map(cell_to_string).collect();
    let records = rows.map(|row| row.iter().map(cell_to_string).collect::<Vec<_>>());

    Ok(rows_from_table(&headers, records))
}

/// Texto de un PDF: una fila por línea que contenga un VIN
pub fn parse_pdf_text(content: &str) -> Vec<RawRow> {
    content
        .lines()
        .enumerate()
        .filter_map(|(index, line)| {
            let upper = line.to_uppercase();
            let vin = PDF_VIN.find(&upper)?.as_str().to_string();

            let mut fields = HashMap::new();
            fields.insert("vin", vin.clone());

            // Buscar año/marca/modelo fuera del VIN
            let rest = line.replacen(&vin, " ", 1).replacen(&vin.to_lowercase(), " ", 1);
            if let Some(caps) = PDF_YEAR_MAKE_MODEL.captures(&rest) {
                fields.insert("year", caps[1].to_string());
                fields.insert("make", caps[2].to_string());
                fields.insert("model", caps[3].to_string());
            }
            if let Some(caps) = PDF_PRICE.captures(&rest) {
                fields.insert("bought_price", caps[1].to_string());
            }

            Some(RawRow {
                row_number: index + 1,
                fields,
            })
        })
        .collect()
}

fn parse_money(value: &str) -> Option<Decimal> {
    let cleaned: String = value.chars().filter(|c| !matches!(c, '$' | ',' | ' ')).collect();
    cleaned.parse::<Decimal>().ok().filter(|d| *d >= Decimal::ZERO)
}

fn parse_integer(value: &str) -> Option<i32> {
    if value.contains('-') {
        return None;
    }
    let cleaned: String = value.chars().filter(|c| c.is_ascii_digit() || *c == '.').collect();
    cleaned.parse::<f64>().ok().filter(|v| *v >= 0.0 && *v <= i32::MAX as f64).map(|v| v as i32)
}

fn parse_date(value: &str) -> Option<NaiveDate> {
    const FORMATS: [&str; 5] = ["%Y-%m-%d", "%m/%d/%Y", "%m/%d/%y", "%Y/%m/%d", "%d-%b-%Y"];
    if let Some(date) = FORMATS.iter().find_map(|f| NaiveDate::parse_from_str(value, f).ok()) {
        return Some(date);
    }
    // Fecha serial de Excel (días desde 1899-12-30)
    let serial = value.parse::<f64>().ok().filter(|s| (1.0..100_000.0).contains(s))?;
    NaiveDate::from_ymd_opt(1899, 12, 30)?.checked_add_signed(Duration::days(serial as i64))
}

/// Valida una fila y la convierte en un vehículo nuevo
pub fn build_vehicle(row: &RawRow) -> Result<NewVehicle, String> {
    let n = row.row_number;

    for field in REQUIRED_FIELDS {
        if row.get(field).is_none() {
            return Err(format!("Row {}: Missing required field '{}'", n, field));
        }
    }

    let vin = normalize_vin(row.get("vin").unwrap_or_default());
    if vin.chars().count() != VIN_LENGTH {
        return Err(format!("Row {}: VIN '{}' must be exactly {} characters", n, vin, VIN_LENGTH));
    }

    let year = row
        .get("year")
        .and_then(parse_integer)
        .filter(|y| (1900..=2100).contains(y))
        .ok_or_else(|| format!("Row {}: Invalid year '{}'", n, row.get("year").unwrap_or_default()))?;

    let optional_money = |field: &str| -> Result<Option<Decimal>, String> {
        row.get(field)
            .map(|raw| parse_money(raw).ok_or_else(|| format!("Row {}: Invalid amount for '{}'", n, field)))
            .transpose()
    };

    let purchase_date = row
        .get("purchase_date")
        .map(|raw| parse_date(raw).ok_or_else(|| format!("Row {}: Invalid date for 'purchase_date'", n)))
        .transpose()?;
    let odometer = row
        .get("odometer")
        .map(|raw| parse_integer(raw).ok_or_else(|| format!("Row {}: Invalid value for 'odometer'", n)))
        .transpose()?;

    let text = |field: &str| row.get(field).map(str::to_string);

    Ok(NewVehicle {
        vin,
        year,
        make: text("make").unwrap_or_default(),
        model: text("model").unwrap_or_default(),
        trim: text("trim"),
        exterior_color: text("color"),
        odometer,
        status: VehicleStatus::Pending,
        title_status: text("title_status"),
        location: text("location"),
        lot_number: text("lot_number"),
        bought_price: optional_money("bought_price")?,
        buy_fee: optional_money("buy_fee")?,
        other_charges: None,
        purchase_date,
        seller_name: text("seller_name"),
    })
}

/// Resultado de validar un lote antes de insertarlo
#[derive(Debug, Default)]
pub struct ImportPlan {
    pub vehicles: Vec<NewVehicle>,
    pub errors: Vec<String>,
}

/// Valida filas y descarta duplicados (en la base y dentro del archivo)
pub async fn plan_import(rows: &[RawRow], index: &dyn VinIndex) -> Result<ImportPlan, AppError> {
    let mut plan = ImportPlan::default();
    let mut seen: HashSet<String> = HashSet::new();

    for row in rows {
        let vehicle = match build_vehicle(row) {
            Ok(vehicle) => vehicle,
            Err(message) => {
                plan.errors.push(message);
                continue;
            }
        };

        if !seen.insert(vehicle.vin.clone()) {
            plan.errors.push(format!(
                "Row {}: Duplicate VIN '{}' in file",
                row.row_number, vehicle.vin
            ));
            continue;
        }
        if index.vin_exists(&vehicle.vin).await? {
            plan.errors.push(format!(
                "Row {}: VIN '{}' already exists",
                row.row_number, vehicle.vin
            ));
            continue;
        }

        plan.vehicles.push(vehicle);
    }

    Ok(plan)
}

pub fn parse_request(request: &ImportVehiclesRequest) -> Result<Vec<RawRow>, AppError> {
    match request.format {
        ImportFormat::Csv => parse_csv(&request.content),
        ImportFormat::Xlsx => parse_xlsx(&request.content),
        ImportFormat::PdfText => Ok(parse_pdf_text(&request.content)),
    }
}

pub struct ImportService {
    vehicles: VehicleRepository,
}

impl ImportService {
    pub fn new(vehicles: VehicleRepository) -> Self {
        Self { vehicles }
    }

    pub async fn import(&self, request: &ImportVehiclesRequest, created_by: Uuid) -> Result<ImportReport, AppError> {
        let rows = parse_request(request)?;
        if rows.is_empty() {
            return Err(AppError::BadRequest("The file contains no vehicle rows".to_string()));
        }

        tracing::info!(
            "📥 Importing {} rows from {}",
            rows.len(),
            request.file_name.as_deref().unwrap_or("upload")
        );

        let plan = plan_import(&rows, &self.vehicles).await?;
        let imported = self.vehicles.bulk_insert(&plan.vehicles, created_by).await? as usize;

        if !plan.errors.is_empty() {
            tracing::warn!("⚠️ Import skipped {} rows", plan.errors.len());
        }
        tracing::info!("✅ Imported {} vehicles", imported);

        Ok(ImportReport {
            success: plan.errors.is_empty(),
            imported,
            skipped: plan.errors.len(),
            errors: plan.errors,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;

    struct KnownVins(HashSet<String>);

    #[async_trait]
    impl VinIndex for KnownVins {
        async fn vin_exists(&self, vin: &str) -> Result<bool, AppError> {
            Ok(self.0.contains(vin))
        }
    }

    fn empty_index() -> KnownVins {
        KnownVins(HashSet::new())
    }

    #[test]
    fn test_header_aliases_are_case_and_space_insensitive() {
        assert_eq!(canonical_field("VIN Number"), Some("vin"));
        assert_eq!(canonical_field(" Model Year "), Some("year"));
        assert_eq!(canonical_field("Purchase Price"), Some("bought_price"));
        assert_eq!(canonical_field("Mileage"), Some("odometer"));
        assert_eq!(canonical_field("Seller"), Some("seller_name"));
        assert_eq!(canonical_field("Favourite Colour Of Owner"), None);
    }

    #[test]
    fn test_negative_odometer_is_rejected() {
        let csv = "VIN,Year,Make,Model,Mileage\n1HGCM82633A004352,2019,Honda,Accord,-5\n";
        let rows = parse_csv(csv).unwrap();

        assert_eq!(
            build_vehicle(&rows[0]).unwrap_err(),
            "Row 2: Invalid value for 'odometer'"
        );
        assert_eq!(parse_integer("12,345 mi"), Some(12345));
        assert_eq!(parse_integer("-5"), None);
    }

    #[tokio::test]
    async fn test_missing_make_is_reported_and_valid_row_imported() {
        let csv = "VIN,Year,Make,Model,Price\n\
                   1HGCM82633A004352,2019,,Accord,12500\n\
                   2T1BURHE0JC074321,2018,Toyota,Corolla,\"$9,800\"\n";
        let rows = parse_csv(csv).unwrap();
        let plan = plan_import(&rows, &empty_index()).await.unwrap();

        assert_eq!(plan.vehicles.len(), 1);
        assert_eq!(plan.vehicles[0].vin, "2T1BURHE0JC074321");
        assert_eq!(plan.vehicles[0].bought_price, Some(Decimal::new(9800, 0)));
        assert_eq!(plan.errors, vec!["Row 2: Missing required field 'make'".to_string()]);
    }

    #[tokio::test]
    async fn test_duplicates_in_database_and_file_are_skipped() {
        let csv = "vin,year,make,model\n\
                   1HGCM82633A004352,2019,Honda,Accord\n\
                   2T1BURHE0JC074321,2018,Toyota,Corolla\n\
                   2t1burhe0jc074321,2018,Toyota,Corolla\n";
        let rows = parse_csv(csv).unwrap();
        let index = KnownVins(HashSet::from(["1HGCM82633A004352".to_string()]));
        let plan = plan_import(&rows, &index).await.unwrap();

        assert_eq!(plan.vehicles.len(), 1);
        assert_eq!(plan.errors.len(), 2);
        assert!(plan.errors[0].contains("already exists"));
        assert!(plan.errors[1].starts_with("Row 4: Duplicate VIN"));
    }

    #[test]
    fn test_short_vin_and_bad_year_are_rejected() {
        let rows = parse_csv("vin,year,make,model\nABC123,2019,Honda,Accord\n1HGCM82633A004352,19x,Honda,Accord\n").unwrap();
        assert!(build_vehicle(&rows[0]).unwrap_err().contains("17 characters"));
        assert!(build_vehicle(&rows[1]).unwrap_err().contains("Invalid year"));
    }

    #[test]
    fn test_optional_fields_are_parsed() {
        let rows = parse_csv(
            "VIN,Year,Make,Model,Mileage,Fees,Date Purchased,Exterior Color\n\
             1HGCM82633A004352,2019,Honda,Accord,\"45,120\",150.50,01/15/2024,Blue\n",
        )
        .unwrap();
        let vehicle = build_vehicle(&rows[0]).unwrap();

        assert_eq!(vehicle.odometer, Some(45120));
        assert_eq!(vehicle.buy_fee, Some(Decimal::new(15050, 2)));
        assert_eq!(vehicle.purchase_date, NaiveDate::from_ymd_opt(2024, 1, 15));
        assert_eq!(vehicle.exterior_color.as_deref(), Some("Blue"));
        assert_eq!(vehicle.status, VehicleStatus::Pending);
    }

    #[test]
    fn test_excel_serial_dates() {
        assert_eq!(parse_date("45306"), NaiveDate::from_ymd_opt(2024, 1, 15));
        assert_eq!(parse_date("not a date"), None);
    }

    #[test]
    fn test_blank_lines_are_ignored() {
        let rows = parse_csv("vin,year,make,model\n,,,\n1HGCM82633A004352,2019,Honda,Accord\n").unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].row_number, 3);
    }

    #[test]
    fn test_pdf_text_lines() {
        let text = "AUCTION RECEIPT\n\
                    Lot 12  1HGCM82633A004352  2019 Honda Accord  $12,500.00\n\
                    Fees and taxes\n\
                    Lot 13 2018 Toyota Corolla 2T1BURHE0JC074321\n";
        let rows = parse_pdf_text(text);

        assert_eq!(rows.len(), 2);
        let first = build_vehicle(&rows[0]).unwrap();
        assert_eq!(first.vin, "1HGCM82633A004352");
        assert_eq!(first.year, 2019);
        assert_eq!(first.make, "Honda");
        assert_eq!(first.model, "Accord");
        assert_eq!(first.bought_price, Some(Decimal::new(12500, 0)));

        let second = build_vehicle(&rows[1]).unwrap();
        assert_eq!(second.make, "Toyota");
        assert_eq!(second.bought_price, None);
        assert_eq!(rows[1].row_number, 4);
    }

    #[test]
    fn test_invalid_base64_spreadsheet() {
        assert!(matches!(parse_xlsx("%%%"), Err(AppError::BadRequest(_))));
    }
}
