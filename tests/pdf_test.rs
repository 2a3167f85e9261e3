//! Integration tests for PDF ingestion.

use std::fs;
use std::path::{Path, PathBuf};

use lopdf::{dictionary, Dictionary, Document, Object, Stream};
use manuscript_ingest::model::FULL_TEXT_FILE;
use manuscript_ingest::pdf::{LopdfBackend, PdfBackend, PdfWalker};
use manuscript_ingest::{ingest, ingest_pdf, DocumentSummary, IngestOptions, LayoutMode};

/// One synthetic page: raw content stream plus its image XObjects.
struct TestPage {
    content: &'static [u8],
    xobjects: Dictionary,
}

fn text_page(content: &'static [u8]) -> TestPage {
    TestPage {
        content,
        xobjects: Dictionary::new(),
    }
}

/// Build a Letter-sized PDF with a shared Helvetica font.
fn build_pdf(path: &Path, pages: Vec<TestPage>) {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();
    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica",
    });

    let mut kids: Vec<Object> = Vec::new();
    for page in pages {
        let content_id = doc.add_object(Stream::new(dictionary! {}, page.content.to_vec()));
        let mut xobjects = Dictionary::new();
        for (name, obj) in page.xobjects.iter() {
            let id = match obj {
                Object::Stream(stream) => doc.add_object(stream.clone()),
                other => doc.add_object(other.clone()),
            };
            xobjects.set(name.clone(), id);
        }
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "MediaBox" => vec![0.into(), 0.into(), 612.into(), 792.into()],
            "Contents" => content_id,
            "Resources" => dictionary! {
                "Font" => dictionary! { "F1" => font_id },
                "XObject" => xobjects,
            },
        });
        kids.push(page_id.into());
    }

    let count = kids.len() as i64;
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => count,
        }),
    );
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);
    doc.save(path).unwrap();
}

fn image(filter: Option<&str>, color_space: &str, data: Vec<u8>) -> Object {
    let mut dict = dictionary! {
        "Type" => "XObject",
        "Subtype" => "Image",
        "Width" => 2,
        "Height" => 2,
        "ColorSpace" => color_space,
        "BitsPerComponent" => 8,
    };
    if let Some(filter) = filter {
        dict.set("Filter", Object::Name(filter.as_bytes().to_vec()));
    }
    Object::Stream(Stream::new(dict, data))
}

fn options_in(root: &Path) -> IngestOptions {
    IngestOptions::new().with_output_root(root)
}

const TWO_COLUMNS: &[u8] = b"BT /F1 12 Tf \
    1 0 0 1 72 700 Tm (Left column text) Tj \
    1 0 0 1 320 700 Tm (Right column text) Tj \
    1 0 0 1 72 680 Tm (second left) Tj \
    1 0 0 1 320 680 Tm (second right) Tj ET";

#[test]
fn test_dual_layout_reconstructs_columns() {
    let dir = tempfile::tempdir().unwrap();
    let pdf = dir.path().join("two col.pdf");
    build_pdf(&pdf, vec![text_page(TWO_COLUMNS)]);

    let options = options_in(dir.path()).with_layout(LayoutMode::Dual);
    let ingested = ingest_pdf(&pdf, "two col.pdf", &options).unwrap();

    assert!(ingested.process_dir.ends_with("process/two_col__pdf"));
    let page = fs::read_to_string(ingested.process_dir.join("page_1.txt")).unwrap();
    assert_eq!(
        page,
        "Left column text\nsecond left\n\nRight column text\nsecond right"
    );
}

#[test]
fn test_single_layout_writes_every_artifact() {
    let dir = tempfile::tempdir().unwrap();
    let pdf = dir.path().join("paper.pdf");
    build_pdf(
        &pdf,
        vec![
            text_page(b"BT /F1 12 Tf 72 700 Td (Hello world from page one) Tj ET"),
            text_page(b"BT /F1 12 Tf 72 700 Td (And this is page two) Tj ET"),
        ],
    );

    let ingested = ingest(&pdf, &options_in(dir.path())).unwrap();
    let summary = &ingested.summary;

    assert_eq!(
        summary.text_files,
        vec![
            ingested.process_dir.join("page_1.txt"),
            ingested.process_dir.join("page_2.txt"),
        ]
    );
    assert!(summary.main_tex.is_none());
    assert!(summary.tables.is_empty());
    assert!(summary.full_text.is_absolute());

    let full = fs::read_to_string(&summary.full_text).unwrap();
    let page1 = fs::read_to_string(&summary.text_files[0]).unwrap();
    let page2 = fs::read_to_string(&summary.text_files[1]).unwrap();
    assert_eq!(full, format!("{}\n\n{}", page1, page2));
    assert!(page1.contains("Hello"));
    assert!(page2.contains("page two"));

    let loaded = DocumentSummary::load(&ingested.process_dir).unwrap();
    assert_eq!(&loaded, summary);
}

#[test]
fn test_images_extracted_and_failures_skipped() {
    let dir = tempfile::tempdir().unwrap();
    let pdf = dir.path().join("figs.pdf");

    let jpeg = vec![0xFF, 0xD8, 0xFF, 0xE0, 0x00, 0x10, b'J', b'F', b'I', b'F', 0xFF, 0xD9];
    let xobjects = dictionary! {
        "Im1" => image(Some("DCTDecode"), "DeviceRGB", jpeg.clone()),
        "Im2" => image(Some("CCITTFaxDecode"), "DeviceGray", vec![0; 4]),
        "Im3" => image(None, "DeviceGray", vec![0, 64, 128, 255]),
    };
    build_pdf(
        &pdf,
        vec![TestPage {
            content: b"q 100 0 0 100 72 400 cm /Im1 Do Q BT /F1 12 Tf 72 700 Td (Figure page) Tj ET",
            xobjects,
        }],
    );

    let ingested = ingest_pdf(&pdf, "figs.pdf", &options_in(dir.path())).unwrap();
    let images: Vec<_> = ingested.summary.embedded_images().cloned().collect();

    assert_eq!(images.len(), 2);
    assert_eq!((images[0].page, images[0].img_index), (1, 1));
    assert_eq!((images[1].page, images[1].img_index), (1, 3));
    assert_eq!(images[0].width, Some(2));

    let jpg = ingested.process_dir.join("page_1_img_1.jpg");
    assert_eq!(images[0].path, jpg);
    assert_eq!(fs::read(&jpg).unwrap(), jpeg);

    let png = fs::read(ingested.process_dir.join("page_1_img_3.png")).unwrap();
    assert_eq!(&png[..4], &[0x89, b'P', b'N', b'G']);

    let leftovers: Vec<PathBuf> = fs::read_dir(&ingested.process_dir)
        .unwrap()
        .map(|e| e.unwrap().path())
        .filter(|p| p.to_string_lossy().contains("img_2"))
        .collect();
    assert!(leftovers.is_empty());
}

#[test]
fn test_walker_over_lopdf_backend() {
    let dir = tempfile::tempdir().unwrap();
    let pdf = dir.path().join("walk.pdf");
    build_pdf(&pdf, vec![text_page(TWO_COLUMNS), text_page(TWO_COLUMNS)]);

    let backend = LopdfBackend::load_file(&pdf).unwrap();
    assert_eq!(backend.page_numbers(), vec![1, 2]);

    // Second page tokens sit one page height further down the document
    let first = backend.tokens(1, 0.0).unwrap();
    let second = backend.tokens(2, 792.0).unwrap();
    assert_eq!(first.len(), second.len());
    assert!((second[0].doctop - first[0].doctop - 792.0).abs() < 1e-6);

    let walker = PdfWalker::new(
        backend,
        &IngestOptions::new().with_layout(LayoutMode::Dual),
    );
    let pages = walker.extract_pages().unwrap();
    assert_eq!(pages.len(), 2);
    assert_eq!(pages[0].text, pages[1].text);
}

#[test]
fn test_reingest_reuses_process_dir() {
    let dir = tempfile::tempdir().unwrap();
    let pdf = dir.path().join("again.pdf");
    build_pdf(&pdf, vec![text_page(TWO_COLUMNS)]);

    let options = options_in(dir.path()).dual_column();
    let first = ingest_pdf(&pdf, "again.pdf", &options).unwrap();
    let second = ingest_pdf(&pdf, "again.pdf", &options).unwrap();

    assert_eq!(first.process_dir, second.process_dir);
    assert_eq!(
        fs::read_to_string(first.process_dir.join(FULL_TEXT_FILE)).unwrap(),
        fs::read_to_string(second.summary.full_text).unwrap()
    );
}

#[test]
fn test_not_a_pdf_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    let bogus = dir.path().join("bogus.pdf");
    fs::write(&bogus, b"%PDF-1.4\nthis is not a real pdf").unwrap();

    assert!(ingest_pdf(&bogus, "bogus.pdf", &options_in(dir.path())).is_err());
}
