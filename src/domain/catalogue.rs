use crate::domain::model::{PackageType, ServiceSelection};
use crate::utils::error::{QuoteError, Result};
use std::str::FromStr;

struct ServiceEntry {
    id: u32,
    title: &'static str,
    description: &'static str,
    image: &'static str,
}

const SERVICES: [ServiceEntry; 6] = [
    ServiceEntry {
        id: 1,
        title: "Parcel Delivery",
        description: "Fast and secure parcel delivery solutions for businesses and individuals. We ensure your packages arrive safely and on schedule.",
        image: "/services-15.jpg",
    },
    ServiceEntry {
        id: 2,
        title: "Fragile Freight",
        description: "Specialized handling for delicate and valuable items. Our experts use proper techniques and materials to protect your fragile shipments.",
        image: "/gallery 6.jpeg",
    },
    ServiceEntry {
        id: 3,
        title: "Chauffeur Services",
        description: "Professional chauffeur services with experienced drivers. We provide reliable transportation for executives, special events, and VIP clients.",
        image: "/chauffeur-2.jpg",
    },
    ServiceEntry {
        id: 4,
        title: "Door to Door Service",
        description: "Convenient pickup and delivery directly from your location to the destination. Let us handle the logistics while you focus on your business.",
        image: "/gallery 2.jpg",
    },
    ServiceEntry {
        id: 5,
        title: "Same Day Delivery",
        description: "Urgent deliveries handled with speed and reliability. Our same-day service ensures your time-sensitive packages reach their destination promptly.",
        image: "/gallery 3.jpg",
    },
    ServiceEntry {
        id: 6,
        title: "Interstate Delivery",
        description: "Seamless interstate logistics solutions connecting businesses across Australia. Our fleet ensures safe and timely delivery across state lines.",
        image: "/upscalemedia-transformed.jpeg",
    },
];

impl ServiceEntry {
    fn to_selection(&self) -> ServiceSelection {
        ServiceSelection {
            id: self.id,
            title: self.title.to_string(),
            description: self.description.to_string(),
            image: self.image.to_string(),
        }
    }
}

pub fn services() -> Vec<ServiceSelection> {
    SERVICES.iter().map(ServiceEntry::to_selection).collect()
}

pub fn find_service(id: u32) -> Option<ServiceSelection> {
    SERVICES
        .iter()
        .find(|entry| entry.id == id)
        .map(ServiceEntry::to_selection)
}

impl PackageType {
    pub const ALL: [PackageType; 7] = [
        PackageType::SmallParcel,
        PackageType::MediumBox,
        PackageType::LargeBox,
        PackageType::DocumentEnvelope,
        PackageType::FragileItem,
        PackageType::Electronics,
        PackageType::Other,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            PackageType::SmallParcel => "Small Parcel",
            PackageType::MediumBox => "Medium Box",
            PackageType::LargeBox => "Large Box",
            PackageType::DocumentEnvelope => "Document Envelope",
            PackageType::FragileItem => "Fragile Item",
            PackageType::Electronics => "Electronics",
            PackageType::Other => "Other",
        }
    }
}

impl FromStr for PackageType {
    type Err = QuoteError;

    /// Accepts the display label case-insensitively, with `-`/`_` standing in for spaces.
    fn from_str(s: &str) -> Result<Self> {
        let wanted = s.trim().replace(['-', '_'], " ").to_lowercase();
        PackageType::ALL
            .iter()
            .copied()
            .find(|kind| kind.label().to_lowercase() == wanted)
            .ok_or_else(|| {
                let known: Vec<&str> = PackageType::ALL.iter().map(|k| k.label()).collect();
                QuoteError::invalid_input(
                    "package_type",
                    format!("Unknown package type '{}'. Choose one of: {}", s, known.join(", ")),
                )
            })
    }
}
