use crate::inference::DiseaseLabel;

/// Static treatment advisory for each disease class.
///
/// `DiseaseLabel` is a closed enum and this match is exhaustive, so a missing
/// entry is a compile error rather than a runtime lookup failure. The two
/// sentinel classes keep entries for completeness even though the pipeline
/// never resolves them here.
pub fn advisory_for(label: DiseaseLabel) -> &'static str {
    match label {
        DiseaseLabel::BacterialSpot => {
            "Remove infected leaves, apply copper-based bactericides, and ensure good air circulation."
        }
        DiseaseLabel::EarlyBlight => {
            "Apply fungicides like chlorothalonil or mancozeb, and rotate crops."
        }
        DiseaseLabel::LateBlight => {
            "Use fungicides containing copper or chlorothalonil, and remove infected plants."
        }
        DiseaseLabel::LeafMold => {
            "Improve ventilation, avoid overhead watering, and apply fungicides if needed."
        }
        DiseaseLabel::SeptoriaLeafSpot => {
            "Remove affected leaves, use fungicides with chlorothalonil or mancozeb, and mulch soil."
        }
        DiseaseLabel::SpiderMites => {
            "Spray neem oil or insecticidal soap, and introduce natural predators like ladybugs."
        }
        DiseaseLabel::TargetSpot => {
            "Apply fungicides like azoxystrobin or difenoconazole, and maintain proper plant spacing."
        }
        DiseaseLabel::YellowLeafCurlVirus => {
            "Control whiteflies with neem oil or insecticides, and plant resistant varieties."
        }
        DiseaseLabel::MosaicVirus => {
            "Remove infected plants, disinfect tools, and avoid handling plants when wet."
        }
        DiseaseLabel::Healthy => {
            "No treatment needed, continue regular plant care and monitoring."
        }
        DiseaseLabel::NotTomatoLeaf => "No treatment needed, this is not a tomato leaf.",
        DiseaseLabel::InvalidInput => "Invalid input, please try again.",
    }
}
