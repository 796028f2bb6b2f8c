use super::*;

#[test]
fn standard_registry_resolves_by_extension_case_insensitively() {
    let reg = ConverterRegistry::standard(200);
    let (ext, c) = reg.resolve("/Designs/Poster.PDF").unwrap();
    assert_eq!(ext, ".pdf");
    assert_eq!(c.name(), "pdftoppm");

    let (ext, c) = reg.resolve("/Designs/logo.png").unwrap();
    assert_eq!(ext, ".png");
    assert_eq!(c.name(), "copy");
}

#[test]
fn unsupported_extension_names_supported_set() {
    let reg = ConverterRegistry::standard(200);
    let err = reg.resolve("/notes/plan.docx").err().unwrap();
    match &err {
        RevlapseError::UnsupportedFormat { ext, supported } => {
            assert_eq!(ext, ".docx");
            assert_eq!(supported, ".pdf, .png");
        }
        other => panic!("unexpected error: {other}"),
    }

    let err = reg.resolve("/notes/README").err().unwrap();
    assert!(matches!(err, RevlapseError::UnsupportedFormat { .. }));
}

#[test]
fn png_copy_is_identity() {
    let raw = b"\x89PNG\r\n\x1a\nrest".to_vec();
    assert_eq!(PngCopy.convert(&raw).unwrap(), raw);
}

#[test]
fn pdf_rasterizer_renders_first_page_when_available() {
    if !is_pdftoppm_on_path() {
        eprintln!("skipping: pdftoppm not on PATH");
        return;
    }
    let png = PdfRasterizer { dpi: 72 }.convert(&minimal_pdf()).unwrap();
    let (w, h) = crate::assets::decode::image_dimensions(&png).unwrap();
    // 100x50 pt page at 72 dpi.
    assert_eq!((w, h), (100, 50));
}

#[test]
fn pdf_rasterizer_rejects_garbage_when_available() {
    if !is_pdftoppm_on_path() {
        eprintln!("skipping: pdftoppm not on PATH");
        return;
    }
    assert!(PdfRasterizer { dpi: 72 }.convert(b"not a pdf").is_err());
}

/// One empty 100x50 pt page with a correct cross-reference table.
fn minimal_pdf() -> Vec<u8> {
    let objects = [
        "<< /Type /Catalog /Pages 2 0 R >>",
        "<< /Type /Pages /Kids [3 0 R] /Count 1 >>",
        "<< /Type /Page /Parent 2 0 R /MediaBox [0 0 100 50] /Resources << >> >>",
    ];
    let mut pdf = b"%PDF-1.4\n".to_vec();
    let mut offsets = Vec::new();
    for (i, body) in objects.iter().enumerate() {
        offsets.push(pdf.len());
        pdf.extend_from_slice(format!("{} 0 obj\n{body}\nendobj\n", i + 1).as_bytes());
    }
    let xref_at = pdf.len();
    let size = objects.len() + 1;
    pdf.extend_from_slice(format!("xref\n0 {size}\n0000000000 65535 f \n").as_bytes());
    for off in offsets {
        pdf.extend_from_slice(format!("{off:010} 00000 n \n").as_bytes());
    }
    pdf.extend_from_slice(
        format!("trailer\n<< /Size {size} /Root 1 0 R >>\nstartxref\n{xref_at}\n%%EOF\n")
            .as_bytes(),
    );
    pdf
}
