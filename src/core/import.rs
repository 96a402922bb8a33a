//! Spreadsheet import - turns heterogeneous `.csv` / `.xlsx` / `.xls` files into
//! validated registros and articulos.
//!
//! Files exported by different people rarely agree on headers ("Compañía",
//! "EMPRESA", "cliente"), date formats (`15-03-2024`, `2024-03-15`, serial day
//! numbers) or number formats (`$15.000`, `1,234.50`). Headers are normalized
//! and matched against known variants, and every cell is parsed leniently.
//! Rows that still fail are skipped and logged, never inserted.

use crate::{
    core::{
        articulo::{self, NewArticulo, UpsertCounts},
        registro::{self, NewRegistro},
        session::Session,
    },
    entities::TipoRegistro,
    errors::{Error, Result},
};
use calamine::{Data, Reader, open_workbook_auto};
use chrono::{Duration, NaiveDate};
use sea_orm::DatabaseConnection;
use serde::Serialize;
use std::{borrow::Cow, collections::HashMap, hash::Hash, io::Read, path::Path};
use tracing::{info, instrument, warn};

/// Canonical registro columns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Campo {
    /// Event date
    Fecha,
    /// BEO code
    Beo,
    /// Venue
    Salon,
    /// Client company
    Compania,
    /// Billed item
    Item,
    /// Kind of line
    Tipo,
    /// Unit price
    Valor,
    /// Units
    Cantidad,
}

/// Known header spellings, already normalized with [`normalize_header`].
const REGISTRO_HEADERS: &[(Campo, &[&str])] = &[
    (Campo::Fecha, &["fecha", "fecha evento", "fecha del evento", "date", "dia"]),
    (Campo::Beo, &["beo", "n beo", "nro beo", "numero beo", "codigo beo", "evento"]),
    (Campo::Salon, &["salon", "salones", "sala", "venue", "lugar", "recinto"]),
    (
        Campo::Compania,
        &["compania", "company", "empresa", "cliente", "client", "razon social"],
    ),
    (
        Campo::Item,
        &["item", "items", "articulo", "producto", "concepto", "descripcion", "detalle"],
    ),
    (Campo::Tipo, &["tipo", "type", "tipo item", "categoria"]),
    (
        Campo::Valor,
        &[
            "valor",
            "valor unitario",
            "precio",
            "precio unitario",
            "unit price",
            "price",
            "monto",
        ],
    ),
    (Campo::Cantidad, &["cantidad", "cant", "qty", "quantity", "unidades"]),
];

const REGISTRO_REQUIRED: &[Campo] = &[
    Campo::Fecha,
    Campo::Salon,
    Campo::Compania,
    Campo::Item,
    Campo::Valor,
    Campo::Cantidad,
];

/// Canonical articulo columns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CampoArticulo {
    /// Business code
    Codigo,
    /// Group
    Grupo,
    /// Subgroup
    Subgrupo,
    /// Description
    Descripcion,
    /// Units on hand
    Stock,
}

const ARTICULO_HEADERS: &[(CampoArticulo, &[&str])] = &[
    (
        CampoArticulo::Codigo,
        &["codigo articulo", "codigo", "cod articulo", "cod", "code", "sku"],
    ),
    (CampoArticulo::Grupo, &["grupo", "group", "familia"]),
    (
        CampoArticulo::Subgrupo,
        &["subgrupo", "sub grupo", "subgroup", "subfamilia"],
    ),
    (
        CampoArticulo::Descripcion,
        &["descripcion", "description", "detalle", "nombre", "articulo"],
    ),
    (
        CampoArticulo::Stock,
        &["en stock", "stock", "existencias", "cantidad", "qty"],
    ),
];

const ARTICULO_REQUIRED: &[CampoArticulo] = &[
    CampoArticulo::Codigo,
    CampoArticulo::Descripcion,
    CampoArticulo::Stock,
];

/// One spreadsheet cell.
///
/// CSV cells are always text. Workbook numbers (and dates, which workbooks store
/// as serial day numbers) stay typed and are never run through the separator
/// heuristics of [`parse_monto`].
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    /// Text as written in the file
    Text(String),
    /// Native numeric value
    Number(f64),
}

impl Cell {
    /// Trimmed display form; integral numbers have no fraction.
    #[must_use]
    pub fn text(&self) -> Cow<'_, str> {
        match self {
            Self::Text(s) => Cow::Borrowed(s.trim()),
            Self::Number(n) => Cow::Owned(number_text(*n)),
        }
    }

    fn is_blank(&self) -> bool {
        matches!(self, Self::Text(s) if s.trim().is_empty())
    }

    /// Reads the cell as a date.
    #[must_use]
    pub fn fecha(&self) -> Option<NaiveDate> {
        match self {
            Self::Text(s) => parse_fecha(s),
            Self::Number(n) => serial_date(*n),
        }
    }

    /// Reads the cell as an amount.
    #[must_use]
    pub fn monto(&self) -> Option<f64> {
        match self {
            Self::Text(s) => parse_monto(s),
            Self::Number(n) => Some(*n).filter(|v| v.is_finite()),
        }
    }

    /// Reads the cell as a whole-unit quantity.
    #[must_use]
    pub fn cantidad(&self) -> Option<i32> {
        match self {
            Self::Text(s) => parse_cantidad(s),
            Self::Number(n) => whole_units(*n),
        }
    }
}

fn number_text(n: f64) -> String {
    if n.fract() == 0.0 && n.abs() < 1e15 {
        #[allow(clippy::cast_possible_truncation)]
        let whole = n as i64;
        whole.to_string()
    } else {
        n.to_string()
    }
}

/// A sheet: the header row and the rows below it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Sheet {
    /// Header cells as written in the file
    pub headers: Vec<String>,
    /// Data rows; may be ragged
    pub rows: Vec<Vec<Cell>>,
}

impl Sheet {
    /// Builds a sheet from raw rows, taking the first non-blank row as headers.
    #[must_use]
    pub fn from_rows(rows: Vec<Vec<Cell>>) -> Self {
        let mut rows = rows.into_iter().skip_while(|r| is_blank(r));
        let headers = rows
            .next()
            .map(|r| r.iter().map(|c| c.text().into_owned()).collect())
            .unwrap_or_default();
        Self {
            headers,
            rows: rows.collect(),
        }
    }
}

/// A data row that was not imported.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkippedRow {
    /// Spreadsheet row number, counting the header row as 1
    pub row: usize,
    /// Why it was skipped
    pub reason: String,
}

/// Result of normalizing a registro sheet.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ImportBatch {
    /// Rows ready to insert
    pub registros: Vec<NewRegistro>,
    /// Rows rejected
    pub skipped: Vec<SkippedRow>,
}

/// Result of normalizing an articulo sheet.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ArticuloBatch {
    /// Rows ready to upsert
    pub articulos: Vec<NewArticulo>,
    /// Rows rejected
    pub skipped: Vec<SkippedRow>,
}

/// What a registro import did.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ImportSummary {
    /// Non-blank data rows read
    pub leidas: usize,
    /// Registros inserted
    pub insertadas: usize,
    /// Rows skipped, with reasons
    pub omitidas: Vec<SkippedRow>,
}

/// What an articulo import did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArticuloImportSummary {
    /// Non-blank data rows read
    pub leidas: usize,
    /// Inserted / updated counts
    pub counts: UpsertCounts,
    /// Rows skipped, with reasons
    pub omitidas: Vec<SkippedRow>,
}

fn fold_accent(c: char) -> char {
    match c {
        'á' | 'à' | 'ä' | 'â' | 'ã' => 'a',
        'é' | 'è' | 'ë' | 'ê' => 'e',
        'í' | 'ì' | 'ï' | 'î' => 'i',
        'ó' | 'ò' | 'ö' | 'ô' | 'õ' => 'o',
        'ú' | 'ù' | 'ü' | 'û' => 'u',
        'ñ' => 'n',
        'ç' => 'c',
        other => other,
    }
}

/// Lowercases, folds accents, turns punctuation into spaces and collapses runs
/// of whitespace: `"  Compañía_Cliente "` becomes `"compania cliente"`.
#[must_use]
pub fn normalize_header(raw: &str) -> String {
    let folded: String = raw
        .chars()
        .flat_map(char::to_lowercase)
        .map(fold_accent)
        .map(|c| if c.is_alphanumeric() { c } else { ' ' })
        .collect();
    folded.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Maps each canonical field to the first column whose normalized header is one
/// of its variants.
#[must_use]
pub fn map_headers<F>(headers: &[String], variants: &[(F, &[&str])]) -> HashMap<F, usize>
where
    F: Copy + Eq + Hash,
{
    let mut mapped = HashMap::new();
    for (index, header) in headers.iter().enumerate() {
        let normalized = normalize_header(header);
        if let Some((field, _)) = variants
            .iter()
            .find(|(field, names)| !mapped.contains_key(field) && names.contains(&normalized.as_str()))
        {
            mapped.insert(*field, index);
        }
    }
    mapped
}

fn missing_columns<F>(mapped: &HashMap<F, usize>, required: &[F]) -> Vec<F>
where
    F: Copy + Eq + Hash,
{
    required
        .iter()
        .filter(|f| !mapped.contains_key(*f))
        .copied()
        .collect()
}

/// Days between the spreadsheet epoch (1899-12-30) and a plausible serial date
/// range, roughly 1954 to 2119.
const SERIAL_RANGE: std::ops::RangeInclusive<f64> = 20_000.0..=80_000.0;

fn spreadsheet_epoch() -> Option<NaiveDate> {
    NaiveDate::from_ymd_opt(1899, 12, 30)
}

fn serial_date(serial: f64) -> Option<NaiveDate> {
    if !SERIAL_RANGE.contains(&serial) {
        return None;
    }
    #[allow(clippy::cast_possible_truncation)]
    let days = serial.floor() as i64;
    spreadsheet_epoch()?.checked_add_signed(Duration::days(days))
}

fn expand_year(year: &str) -> Option<i32> {
    let value: i32 = year.parse().ok()?;
    match year.len() {
        4 => Some(value),
        2 if value < 70 => Some(2000 + value),
        2 => Some(1900 + value),
        _ => None,
    }
}

/// Parses a date cell.
///
/// Accepted forms:
/// - ISO `YYYY-MM-DD` or `YYYY/MM/DD`, optionally followed by a time
/// - `DD-MM-YYYY`, `DD/MM/YYYY`, `DD.MM.YYYY`, also with two-digit years
/// - spreadsheet serial day numbers (`45366` is 2024-03-15)
///
/// Day-first is assumed for `a-b-YYYY`; when the middle part cannot be a month
/// but the first can, the date is read month-first instead.
#[must_use]
pub fn parse_fecha(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    if let Some(serial) = raw.parse::<f64>().ok().filter(|s| SERIAL_RANGE.contains(s)) {
        return serial_date(serial);
    }

    let date_part = raw.split(['T', ' ']).next()?;
    let parts: Vec<&str> = date_part.split(['-', '/', '.']).collect();
    let [a, b, c] = parts.as_slice() else {
        return None;
    };
    if ![a, b, c]
        .iter()
        .all(|p| !p.is_empty() && p.chars().all(|ch| ch.is_ascii_digit()))
    {
        return None;
    }

    if a.len() == 4 {
        return NaiveDate::from_ymd_opt(a.parse().ok()?, b.parse().ok()?, c.parse().ok()?);
    }

    let year = expand_year(c)?;
    let first: u32 = a.parse().ok()?;
    let second: u32 = b.parse().ok()?;
    if second > 12 && first <= 12 {
        NaiveDate::from_ymd_opt(year, first, second)
    } else {
        NaiveDate::from_ymd_opt(year, second, first)
    }
}

/// Parses a money cell.
///
/// Currency markers and spaces are dropped. When both `.` and `,` occur the
/// last one is the decimal separator. A lone separator followed by exactly three
/// digits is a thousands separator (`$15.000` is fifteen thousand), except after
/// a leading zero (`0.125`). Repeated separators are always thousands.
#[must_use]
pub fn parse_monto(raw: &str) -> Option<f64> {
    let cleaned: String = raw
        .chars()
        .filter(|c| c.is_ascii_digit() || matches!(c, '.' | ',' | '-'))
        .collect();
    if !cleaned.chars().any(|c| c.is_ascii_digit()) {
        return None;
    }

    let normalized = match (cleaned.rfind('.'), cleaned.rfind(',')) {
        (Some(dot), Some(comma)) => {
            let (decimal, thousands) = if dot > comma { ('.', ',') } else { (',', '.') };
            cleaned.replace(thousands, "").replace(decimal, ".")
        }
        (Some(_), None) => single_separator(&cleaned, '.'),
        (None, Some(_)) => single_separator(&cleaned, ','),
        (None, None) => cleaned,
    };

    normalized.parse::<f64>().ok().filter(|v| v.is_finite())
}

fn single_separator(cleaned: &str, sep: char) -> String {
    let occurrences = cleaned.matches(sep).count();
    let (integer, fraction) = cleaned.split_once(sep).unwrap_or((cleaned, ""));
    let integer_digits = integer.trim_start_matches('-');
    let is_thousands = occurrences > 1 || (fraction.len() == 3 && integer_digits != "0");
    if is_thousands {
        cleaned.replace(sep, "")
    } else {
        cleaned.replace(sep, ".")
    }
}

/// Parses a whole-unit quantity cell; fractional quantities are rejected.
#[must_use]
pub fn parse_cantidad(raw: &str) -> Option<i32> {
    whole_units(parse_monto(raw)?)
}

fn whole_units(value: f64) -> Option<i32> {
    if value.fract() != 0.0 || value < f64::from(i32::MIN) || value > f64::from(i32::MAX) {
        return None;
    }
    #[allow(clippy::cast_possible_truncation)]
    Some(value as i32)
}

/// Parses a tipo cell, accent and case-insensitively. Blank yields `default`.
#[must_use]
pub fn parse_tipo(raw: &str, default: TipoRegistro) -> Option<TipoRegistro> {
    let compact = normalize_header(raw).replace(' ', "");
    match compact.as_str() {
        "" => Some(default),
        "venta" | "ventas" => Some(TipoRegistro::Venta),
        "subarriendo" | "subarriendos" | "subarrendado" => Some(TipoRegistro::SubArriendo),
        "estandar" | "standard" | "std" => Some(TipoRegistro::Estandar),
        "adicional" | "adicionales" | "extra" => Some(TipoRegistro::Adicional),
        _ => None,
    }
}

fn is_blank(row: &[Cell]) -> bool {
    row.iter().all(Cell::is_blank)
}

fn cell<'a, F>(row: &'a [Cell], mapped: &HashMap<F, usize>, field: F) -> Option<&'a Cell>
where
    F: Copy + Eq + Hash,
{
    mapped
        .get(&field)
        .and_then(|&i| row.get(i))
        .filter(|c| !c.is_blank())
}

fn text<F>(row: &[Cell], mapped: &HashMap<F, usize>, field: F) -> String
where
    F: Copy + Eq + Hash,
{
    cell(row, mapped, field).map_or_else(String::new, |c| c.text().into_owned())
}

fn required<'a, F>(
    row: &'a [Cell],
    mapped: &HashMap<F, usize>,
    field: F,
    name: &str,
) -> std::result::Result<&'a Cell, String>
where
    F: Copy + Eq + Hash,
{
    cell(row, mapped, field).ok_or_else(|| format!("falta {name}"))
}

fn registro_from_row(
    row: &[Cell],
    mapped: &HashMap<Campo, usize>,
    default_tipo: TipoRegistro,
) -> std::result::Result<NewRegistro, String> {
    let fecha_cell = required(row, mapped, Campo::Fecha, "fecha")?;
    let salon = required(row, mapped, Campo::Salon, "salon")?.text();
    let compania = required(row, mapped, Campo::Compania, "compania")?.text();
    let item = required(row, mapped, Campo::Item, "item")?.text();
    let valor_cell = required(row, mapped, Campo::Valor, "valor")?;
    let cantidad_cell = required(row, mapped, Campo::Cantidad, "cantidad")?;

    let fecha = fecha_cell
        .fecha()
        .ok_or_else(|| format!("fecha inválida '{}'", fecha_cell.text()))?;
    let valor = valor_cell
        .monto()
        .ok_or_else(|| format!("valor inválido '{}'", valor_cell.text()))?;
    let cantidad = cantidad_cell
        .cantidad()
        .ok_or_else(|| format!("cantidad inválida '{}'", cantidad_cell.text()))?;
    let tipo_raw = text(row, mapped, Campo::Tipo);
    let tipo =
        parse_tipo(&tipo_raw, default_tipo).ok_or_else(|| format!("tipo desconocido '{tipo_raw}'"))?;
    let beo = Some(text(row, mapped, Campo::Beo));

    registro::validate_registro(NewRegistro {
        fecha,
        beo,
        salon: salon.into_owned(),
        compania: compania.into_owned(),
        item: item.into_owned(),
        tipo,
        valor,
        cantidad,
    })
    .map_err(|e| e.to_string())
}

/// Header row number in [`SkippedRow::row`] terms.
const HEADER_ROW: usize = 1;

/// Normalizes a registro sheet into insertable rows and skipped rows.
///
/// Blank rows are ignored without being reported.
///
/// # Errors
/// Returns [`Error::Import`] if a required column has no recognizable header.
pub fn normalize_rows(sheet: &Sheet, default_tipo: TipoRegistro) -> Result<ImportBatch> {
    let mapped = map_headers(&sheet.headers, REGISTRO_HEADERS);
    let missing = missing_columns(&mapped, REGISTRO_REQUIRED);
    if !missing.is_empty() {
        return Err(Error::Import {
            message: format!("Missing required columns: {missing:?}"),
        });
    }

    let mut batch = ImportBatch::default();
    for (index, row) in sheet.rows.iter().enumerate() {
        if is_blank(row) {
            continue;
        }
        let row_number = HEADER_ROW + 1 + index;
        match registro_from_row(row, &mapped, default_tipo) {
            Ok(registro) => batch.registros.push(registro),
            Err(reason) => {
                warn!(row = row_number, %reason, "Skipping import row");
                batch.skipped.push(SkippedRow {
                    row: row_number,
                    reason,
                });
            }
        }
    }
    Ok(batch)
}

fn articulo_from_row(
    row: &[Cell],
    mapped: &HashMap<CampoArticulo, usize>,
) -> std::result::Result<NewArticulo, String> {
    let codigo = required(row, mapped, CampoArticulo::Codigo, "codigo")?.text();
    let descripcion = required(row, mapped, CampoArticulo::Descripcion, "descripcion")?.text();
    let stock_cell = required(row, mapped, CampoArticulo::Stock, "stock")?;
    let en_stock = stock_cell
        .cantidad()
        .filter(|s| *s >= 0)
        .ok_or_else(|| format!("stock inválido '{}'", stock_cell.text()))?;

    articulo::validate_articulo(NewArticulo {
        codigo_articulo: codigo.into_owned(),
        grupo: text(row, mapped, CampoArticulo::Grupo),
        subgrupo: text(row, mapped, CampoArticulo::Subgrupo),
        descripcion: descripcion.into_owned(),
        en_stock,
    })
    .map_err(|e| e.to_string())
}

/// Normalizes an inventory sheet into upsertable articulos and skipped rows.
///
/// # Errors
/// Returns [`Error::Import`] if a required column has no recognizable header.
pub fn normalize_articulo_rows(sheet: &Sheet) -> Result<ArticuloBatch> {
    let mapped = map_headers(&sheet.headers, ARTICULO_HEADERS);
    let missing = missing_columns(&mapped, ARTICULO_REQUIRED);
    if !missing.is_empty() {
        return Err(Error::Import {
            message: format!("Missing required columns: {missing:?}"),
        });
    }

    let mut batch = ArticuloBatch::default();
    for (index, row) in sheet.rows.iter().enumerate() {
        if is_blank(row) {
            continue;
        }
        let row_number = HEADER_ROW + 1 + index;
        match articulo_from_row(row, &mapped) {
            Ok(articulo) => batch.articulos.push(articulo),
            Err(reason) => {
                warn!(row = row_number, %reason, "Skipping inventory row");
                batch.skipped.push(SkippedRow {
                    row: row_number,
                    reason,
                });
            }
        }
    }
    Ok(batch)
}

fn sniff_delimiter(first_line: &str) -> u8 {
    [b';', b',', b'\t']
        .into_iter()
        .max_by_key(|d| first_line.bytes().filter(|b| b == d).count())
        .unwrap_or(b',')
}

/// Reads CSV text, sniffing the delimiter from the first line and skipping a
/// UTF-8 BOM.
pub fn read_csv<R: Read>(mut reader: R) -> Result<Sheet> {
    let mut text = String::new();
    reader.read_to_string(&mut text)?;
    let text = text.trim_start_matches('\u{feff}');
    let delimiter = sniff_delimiter(text.lines().next().unwrap_or_default());

    let mut csv_reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .has_headers(false)
        .flexible(true)
        .from_reader(text.as_bytes());

    let rows = csv_reader
        .records()
        .map(|record| record.map(|r| r.iter().map(|c| Cell::Text(c.to_string())).collect()))
        .collect::<std::result::Result<Vec<Vec<Cell>>, csv::Error>>()?;
    Ok(Sheet::from_rows(rows))
}

#[allow(clippy::cast_precision_loss)]
fn workbook_cell(data: &Data) -> Cell {
    match data {
        Data::Empty | Data::Error(_) => Cell::Text(String::new()),
        Data::String(s) | Data::DateTimeIso(s) | Data::DurationIso(s) => Cell::Text(s.clone()),
        Data::Bool(b) => Cell::Text(b.to_string()),
        Data::Int(i) => Cell::Number(*i as f64),
        Data::Float(f) => Cell::Number(*f),
        Data::DateTime(dt) => Cell::Number(dt.as_f64()),
    }
}

fn read_workbook(path: &Path) -> Result<Sheet> {
    let mut workbook = open_workbook_auto(path)?;
    let range = workbook
        .worksheet_range_at(0)
        .ok_or_else(|| Error::Import {
            message: format!("{} has no worksheets", path.display()),
        })??;

    let rows = range
        .rows()
        .map(|row| row.iter().map(workbook_cell).collect())
        .collect();
    Ok(Sheet::from_rows(rows))
}

/// Reads the first sheet of a `.csv`, `.xlsx`, `.xlsm` or `.xls` file.
///
/// # Errors
/// Returns [`Error::Import`] for other extensions or unreadable content.
#[instrument]
pub fn read_sheet(path: &Path) -> Result<Sheet> {
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase)
        .unwrap_or_default();

    let sheet = match extension.as_str() {
        "csv" => read_csv(std::fs::File::open(path)?)?,
        "xlsx" | "xlsm" | "xls" => read_workbook(path)?,
        other => {
            return Err(Error::Import {
                message: format!("Unsupported file type '.{other}', expected .xlsx, .xls or .csv"),
            });
        }
    };
    info!(
        columns = sheet.headers.len(),
        rows = sheet.rows.len(),
        "Sheet read"
    );
    Ok(sheet)
}

/// Reads, normalizes and inserts a registro spreadsheet for the session user.
///
/// Valid rows are inserted in one store transaction; skipped rows are reported
/// in the summary.
pub async fn import_registros(
    db: &DatabaseConnection,
    session: &Session,
    path: &Path,
    default_tipo: TipoRegistro,
) -> Result<ImportSummary> {
    let sheet = read_sheet(path)?;
    let batch = normalize_rows(&sheet, default_tipo)?;
    let leidas = batch.registros.len() + batch.skipped.len();

    let insertadas = registro::create_registros(db, session, batch.registros).await?;
    info!(
        leidas,
        insertadas,
        omitidas = batch.skipped.len(),
        "Registro import finished"
    );
    Ok(ImportSummary {
        leidas,
        insertadas,
        omitidas: batch.skipped,
    })
}

/// Reads, normalizes and upserts an inventory spreadsheet.
pub async fn import_articulos(
    db: &DatabaseConnection,
    path: &Path,
) -> Result<ArticuloImportSummary> {
    let sheet = read_sheet(path)?;
    let batch = normalize_articulo_rows(&sheet)?;
    let leidas = batch.articulos.len() + batch.skipped.len();

    let counts = articulo::upsert_articulos(db, batch.articulos).await?;
    Ok(ArticuloImportSummary {
        leidas,
        counts,
        omitidas: batch.skipped,
    })
}
