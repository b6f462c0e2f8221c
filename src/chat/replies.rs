//! Canned assistant replies.

use super::AlertLevel;
use rand::Rng;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Reply {
    pub content: &'static str,
    pub location: Option<&'static str>,
    pub alert_level: Option<AlertLevel>,
    pub sources: &'static [&'static str],
}

pub const REPLIES: &[Reply] = &[
    Reply {
        content: "Medium alert for the Mumbai coast: waves of 2-3m expected with strong currents near Juhu Beach. Avoid water activities until conditions ease.",
        location: Some("Mumbai Coast"),
        alert_level: Some(AlertLevel::Medium),
        sources: &["INCOIS Real-time Data", "Coast Guard Reports"],
    },
    Reply {
        content: "Recent social posts about coastal conditions are trending around cyclone alerts in Andhra Pradesh, oil spill sightings in Kerala and rough seas near Chennai. Ask about a region for details.",
        location: None,
        alert_level: None,
        sources: &["Social Media Analysis"],
    },
    Reply {
        content: "Hazard levels at major ports: Mumbai medium, Chennai high, Kochi high (pollution), Visakhapatnam very high (cyclone), Goa low. Conditions are worsening along the eastern coast.",
        location: None,
        alert_level: None,
        sources: &["Port Authorities", "Weather Services", "Real-time Sensors"],
    },
    Reply {
        content: "High alert for Tamil Nadu: a low-pressure system is developing in the Bay of Bengal with impact expected in 48-72 hours. Waves may reach 4-6m along the Chennai-Cuddalore coast; fishing should be suspended.",
        location: Some("Chennai Marina"),
        alert_level: Some(AlertLevel::High),
        sources: &["India Meteorological Department", "INCOIS Buoy Data"],
    },
    Reply {
        content: "Low alert for Goa: Calangute and Anjuna show yellow-flag conditions, Morjim has reported rip currents, and Palolem remains safe for swimming.",
        location: Some("Goa Beaches"),
        alert_level: Some(AlertLevel::Low),
        sources: &["Goa Tourism Board", "Lifeguard Reports"],
    },
    Reply {
        content: "Accelerated erosion detected at Varkala and Kovalam in Kerala, with noticeable shoreline retreat over recent months. Local communities have reported dozens of incidents.",
        location: Some("Kerala Coast"),
        alert_level: Some(AlertLevel::Medium),
        sources: &["Satellite Imagery", "Local Community Reports"],
    },
    Reply {
        content: "Pollution alert: an oil spill has been reported off Kochi and plastic debris is concentrated near the Mumbai coast. Environmental response teams are deployed.",
        location: Some("Kochi Backwaters"),
        alert_level: Some(AlertLevel::High),
        sources: &["Coast Guard Surveillance", "Environmental NGOs"],
    },
    Reply {
        content: "Tsunami risk is currently minimal. A watch status remains for the Andhra Pradesh and Odisha coasts due to minor sea level fluctuations; no evacuation is required.",
        location: None,
        alert_level: Some(AlertLevel::Low),
        sources: &["National Tsunami Warning Center", "INCOIS Alerts"],
    },
];

const ROUTES: &[(&[&str], usize)] = &[
    (&["cyclone", "tamil nadu"], 3),
    (&["goa", "swimming"], 4),
    (&["kerala", "erosion"], 5),
    (&["pollution", "oil spill"], 6),
    (&["tsunami"], 7),
];

/// Pick a reply for `message`, by keyword when one matches, otherwise at random.
pub fn pick_reply<R: Rng + ?Sized>(message: &str, rng: &mut R) -> Reply {
    let lowered = message.to_lowercase();

    for (keywords, idx) in ROUTES {
        if keywords.iter().any(|k| lowered.contains(k)) {
            return REPLIES[*idx];
        }
    }

    REPLIES[rng.gen_range(0..REPLIES.len())]
}
