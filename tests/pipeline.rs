use image::RgbImage;
use kyc_form_digitizer::prelude::*;
use kyc_form_digitizer::processors::{LineGrouper, extract_fields};
use std::sync::Mutex;

/// OCR stub returning a fixed list of words.
struct StubOcr {
    words: Vec<Word>,
}

impl WordDetector for StubOcr {
    fn detect_words(&self, _image: &RgbImage) -> Result<Vec<Word>, DigitizerError> {
        Ok(self.words.clone())
    }

    fn name(&self) -> &str {
        "stub-ocr"
    }
}

/// Classifier stub emitting one token per word with a scripted tag and
/// continuation flag, and recording the boxes it received.
struct StubClassifier {
    script: Vec<(&'static str, bool)>,
    received: std::sync::Arc<Mutex<Vec<NormalizedBox>>>,
}

impl TokenClassifier for StubClassifier {
    fn classify(
        &self,
        _image: &RgbImage,
        words: &[String],
        boxes: &[NormalizedBox],
    ) -> Result<ClassificationResult, DigitizerError> {
        self.received.lock().unwrap().extend_from_slice(boxes);

        let mut tokens = vec![ClassifiedToken::special("<s>", "O")];
        for ((word, bbox), (tag, continuation)) in words.iter().zip(boxes).zip(&self.script) {
            tokens.push(ClassifiedToken::new(word.as_str(), *tag, *bbox, *continuation));
        }
        tokens.push(ClassifiedToken::special("</s>", "O"));
        tokens.push(ClassifiedToken::special("<pad>", "B-ANSWER"));
        Ok(ClassificationResult::new(tokens, Default::default()))
    }

    fn name(&self) -> &str {
        "stub-classifier"
    }
}

/// One visual row: "Name : John Doe" on a 1000x1000 page.
fn name_row() -> Vec<Word> {
    vec![
        Word::new("Name", PixelBox::new(40, 100, 80, 20)),
        Word::new(":", PixelBox::new(125, 101, 6, 18)),
        Word::new("John", PixelBox::new(300, 102, 70, 20)),
        Word::new("Doe", PixelBox::new(375, 103, 60, 20)),
    ]
}

fn digitizer(
    words: Vec<Word>,
    script: Vec<(&'static str, bool)>,
) -> (FormDigitizer, std::sync::Arc<Mutex<Vec<NormalizedBox>>>) {
    let received = std::sync::Arc::new(Mutex::new(Vec::new()));
    let digitizer = FormDigitizer::new(
        StubOcr { words },
        StubClassifier {
            script,
            received: received.clone(),
        },
    );
    (digitizer, received)
}

#[test]
fn test_continuation_piece_is_glued_without_space() {
    let (digitizer, _) = digitizer(
        name_row(),
        vec![
            ("B-QUESTION", false),
            ("O", false),
            ("B-ANSWER", false),
            ("I-ANSWER", true),
        ],
    );

    let analysis = digitizer.analyze(&RgbImage::new(1000, 1000)).unwrap();
    assert_eq!(analysis.fields, vec![Field::new("Name", "JohnDoe")]);
    assert_eq!(analysis.word_count, 4);
    assert_eq!(analysis.token_count, 4);
}

#[test]
fn test_separate_words_are_space_joined() {
    let (digitizer, _) = digitizer(
        name_row(),
        vec![
            ("B-QUESTION", false),
            ("O", false),
            ("B-ANSWER", false),
            ("I-ANSWER", false),
        ],
    );

    let analysis = digitizer.analyze(&RgbImage::new(1000, 1000)).unwrap();
    assert_eq!(analysis.fields, vec![Field::new("Name", "John Doe")]);
    assert_eq!(analysis.lines.len(), 1);
    assert_eq!(analysis.lines[0].len(), 3);
}

#[test]
fn test_classifier_receives_normalized_boxes() {
    let (digitizer, received) = digitizer(
        vec![Word::new("Nom", PixelBox::new(100, 50, 200, 25))],
        vec![("B-QUESTION", false)],
    );

    digitizer.analyze(&RgbImage::new(2000, 500)).unwrap();
    assert_eq!(
        *received.lock().unwrap(),
        vec![NormalizedBox::new(50, 100, 150, 150)]
    );
}

#[test]
fn test_multi_row_form() {
    let words = vec![
        Word::new("Adresse", PixelBox::new(40, 300, 120, 20)),
        Word::new("Tunis", PixelBox::new(400, 302, 90, 20)),
        Word::new("KYC", PixelBox::new(450, 20, 100, 40)),
        Word::new("Nom", PixelBox::new(40, 100, 60, 20)),
        Word::new("Tourki", PixelBox::new(400, 101, 90, 20)),
        Word::new("12345678", PixelBox::new(400, 500, 150, 20)),
    ];
    let (digitizer, _) = digitizer(
        words,
        vec![
            ("B-QUESTION", false),
            ("B-ANSWER", false),
            ("B-HEADER", false),
            ("B-QUESTION", false),
            ("B-ANSWER", false),
            ("B-ANSWER", false),
        ],
    );

    let analysis = digitizer.analyze(&RgbImage::new(1000, 1000)).unwrap();
    assert_eq!(
        analysis.fields,
        vec![
            Field::new("Nom", "Tourki"),
            Field::new("Adresse", "Tunis"),
            Field::new("Champ détecté", "12345678"),
        ]
    );
    // The header row yields a line but no field.
    assert_eq!(analysis.lines.len(), 4);
}

#[test]
fn test_no_text_detected() {
    let (digitizer, received) = digitizer(Vec::new(), Vec::new());
    let err = digitizer.analyze(&RgbImage::new(100, 100)).unwrap_err();
    assert!(matches!(err, DigitizerError::NoTextDetected));
    assert!(received.lock().unwrap().is_empty());
}

#[test]
fn test_zero_sized_image_is_rejected() {
    let (digitizer, _) = digitizer(name_row(), Vec::new());
    let err = digitizer.analyze(&RgbImage::new(640, 0)).unwrap_err();
    assert!(matches!(
        err,
        DigitizerError::InvalidImage {
            width: 640,
            height: 0
        }
    ));
    assert!(err.is_client_error());
}

#[test]
fn test_reconstruction_is_idempotent() {
    let (digitizer, _) = digitizer(
        name_row(),
        vec![
            ("B-QUESTION", false),
            ("O", false),
            ("B-ANSWER", false),
            ("I-ANSWER", true),
        ],
    );
    let classifier = StubClassifier {
        script: vec![
            ("B-QUESTION", false),
            ("O", false),
            ("B-ANSWER", false),
            ("I-ANSWER", true),
        ],
        received: Default::default(),
    };
    let words: Vec<String> = name_row().into_iter().map(|w| w.text).collect();
    let boxes = vec![
        NormalizedBox::new(40, 100, 120, 120),
        NormalizedBox::new(125, 101, 131, 119),
        NormalizedBox::new(300, 102, 370, 122),
        NormalizedBox::new(375, 103, 435, 123),
    ];
    let result = classifier
        .classify(&RgbImage::new(1, 1), &words, &boxes)
        .unwrap();

    let first = digitizer.extract_fields(&result);
    let second = digitizer.extract_fields(&result);
    assert_eq!(first, second);
    assert_eq!(first, extract_fields(&result, &LineGrouper::default()));
    assert_eq!(first, vec![Field::new("Name", "JohnDoe")]);
}

#[test]
#[ignore] // Requires a LayoutLMv3 model directory in KYC_MODEL_DIR and tesseract
fn test_real_pipeline_loads() {
    let Ok(model_dir) = std::env::var("KYC_MODEL_DIR") else {
        return;
    };
    let digitizer = FormDigitizer::from_config(&DigitizerConfig::new(model_dir)).unwrap();
    let blank = RgbImage::from_pixel(800, 600, image::Rgb([255, 255, 255]));
    assert!(matches!(
        digitizer.analyze(&blank),
        Err(DigitizerError::NoTextDetected)
    ));
}
