use std::fs::OpenOptions;
use std::io::Write;
use std::path::Path;

use anyhow::Context as _;

use crate::formats::ResultRecord;

const SOURCE_SUFFIXES: [&str; 4] = ["a", "b", "c", "d"];

/// Column names for `records`: source columns, then every field in
/// first-seen order, then the generated text.
pub fn columns(records: &[ResultRecord]) -> Vec<String> {
    let max_sources = source_count(records);

    let mut columns = Vec::new();
    if max_sources <= 1 {
        columns.push("url".to_owned());
        columns.push("site".to_owned());
    } else {
        for idx in 0..max_sources {
            let suffix = source_suffix(idx);
            columns.push(format!("url_{suffix}"));
            columns.push(format!("site_{suffix}"));
        }
    }

    let mut fields: Vec<&str> = Vec::new();
    for record in records {
        for key in record.fields.keys() {
            if !fields.contains(&key.as_str()) {
                fields.push(key.as_str());
            }
        }
    }
    columns.extend(fields.into_iter().map(str::to_owned));

    columns.push("generated_description".to_owned());
    columns.push("generated_at".to_owned());
    columns
}

fn source_count(records: &[ResultRecord]) -> usize {
    records
        .iter()
        .map(|record| record.sources.len())
        .max()
        .unwrap_or(1)
        .max(1)
}

fn source_suffix(idx: usize) -> String {
    SOURCE_SUFFIXES
        .get(idx)
        .map(|s| (*s).to_owned())
        .unwrap_or_else(|| (idx + 1).to_string())
}

pub fn write_csv<W: Write>(records: &[ResultRecord], writer: W) -> anyhow::Result<()> {
    let columns = columns(records);
    let max_sources = source_count(records);
    let field_columns = &columns[max_sources * 2..columns.len() - 2];

    let mut csv = csv::Writer::from_writer(writer);
    csv.write_record(&columns).context("write csv header")?;

    for record in records {
        let mut row = Vec::with_capacity(columns.len());
        for idx in 0..max_sources {
            match record.sources.get(idx) {
                Some(source) => {
                    row.push(source.url.clone());
                    row.push(source.site.to_string());
                }
                None => {
                    row.push(String::new());
                    row.push(String::new());
                }
            }
        }
        for column in field_columns {
            row.push(record.fields.get(column).cloned().unwrap_or_default());
        }
        row.push(record.generated_description.clone());
        row.push(record.generated_at.clone());

        csv.write_record(&row)
            .with_context(|| format!("write csv row for item {}", record.index + 1))?;
    }

    csv.flush().context("flush csv")?;
    Ok(())
}

pub fn write_csv_file(path: &Path, records: &[ResultRecord], force: bool) -> anyhow::Result<()> {
    if path.exists() && !force {
        anyhow::bail!(
            "output already exists: {} (use --force to overwrite)",
            path.display()
        );
    }
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("create output dir: {}", parent.display()))?;
    }

    let file = OpenOptions::new()
        .create(true)
        .truncate(true)
        .write(true)
        .open(path)
        .with_context(|| format!("create csv: {}", path.display()))?;
    write_csv(records, file).with_context(|| format!("write csv: {}", path.display()))
}

#[cfg(test)]
mod tests {
    use indexmap::IndexMap;

    use super::*;
    use crate::formats::SourceUrl;
    use crate::site::SiteKind;

    fn record(index: usize, sources: &[(&str, SiteKind)], fields: &[(&str, &str)]) -> ResultRecord {
        ResultRecord {
            index,
            sources: sources
                .iter()
                .map(|(url, site)| SourceUrl {
                    url: (*url).to_owned(),
                    site: *site,
                })
                .collect(),
            fields: fields
                .iter()
                .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
                .collect::<IndexMap<_, _>>(),
            generated_description: format!("<p>opis {index}</p>"),
            generated_at: "2026-01-01T00:00:00+00:00".to_owned(),
        }
    }

    #[test]
    fn single_source_columns_union_fields_in_first_seen_order() -> anyhow::Result<()> {
        let records = [
            record(
                0,
                &[("https://lubimyczytac.pl/ksiazka/1", SiteKind::LubimyCzytac)],
                &[("description", "Opis X"), ("reviews", "Dobra, \"naprawdę\"\n---")],
            ),
            record(
                1,
                &[("https://sklep.nowaera.pl/p", SiteKind::NowaEra)],
                &[("title", "Matematyka"), ("description", "Podręcznik")],
            ),
        ];

        let mut out = Vec::new();
        write_csv(&records, &mut out)?;
        let text = String::from_utf8(out)?;

        let mut reader = csv::Reader::from_reader(text.as_bytes());
        let header = reader.headers()?.clone();
        assert_eq!(
            header.iter().collect::<Vec<_>>(),
            [
                "url",
                "site",
                "description",
                "reviews",
                "title",
                "generated_description",
                "generated_at"
            ]
        );

        let rows = reader.records().collect::<Result<Vec<_>, _>>()?;
        assert_eq!(rows.len(), 2);
        assert_eq!(&rows[0][1], "lubimyczytac");
        assert_eq!(&rows[0][3], "Dobra, \"naprawdę\"\n---");
        assert_eq!(&rows[0][4], "");
        assert_eq!(&rows[1][4], "Matematyka");
        assert_eq!(&rows[1][5], "<p>opis 1</p>");
        Ok(())
    }

    #[test]
    fn paired_sources_get_lettered_columns() {
        let records = [record(
            0,
            &[
                ("https://bookland.com.pl/1", SiteKind::Bookland),
                ("https://taniaksiazka.pl/1", SiteKind::TaniaKsiazka),
            ],
            &[("title", "T")],
        )];
        assert_eq!(
            columns(&records),
            [
                "url_a",
                "site_a",
                "url_b",
                "site_b",
                "title",
                "generated_description",
                "generated_at"
            ]
        );
    }

    #[test]
    fn write_csv_file_refuses_to_overwrite_without_force() -> anyhow::Result<()> {
        let temp = tempfile::TempDir::new()?;
        let path = temp.path().join("out.csv");
        std::fs::write(&path, "old")?;

        let records = [record(0, &[("https://bookland.com.pl/1", SiteKind::Bookland)], &[])];
        assert!(write_csv_file(&path, &records, false).is_err());
        write_csv_file(&path, &records, true)?;
        assert!(std::fs::read_to_string(&path)?.starts_with("url,site,"));
        Ok(())
    }
}
