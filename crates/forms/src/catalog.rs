//! The two registered forms.

use crate::field::{FieldDescriptor as F, FieldKind, Rule};
use crate::schema::{EntityKind, FormSchema, RepeatingGroup};

const MSG_BUDGET: &str = "Please enter a valid budget amount.";
const MSG_SIZE: &str = "Please enter a valid size.";

fn positive(message: &str) -> Rule {
    Rule::PositiveNumber {
        message: message.to_string(),
    }
}

pub fn buyer_profile_form() -> FormSchema {
    FormSchema::new(
        EntityKind::Buyer,
        "Buyer Profile",
        vec![
            F::new("buyerName", "Buyer Name", FieldKind::Text)
                .required()
                .rule(Rule::MinLength {
                    min: 2,
                    message: "Buyer name must be at least 2 characters long.".into(),
                }),
            F::new("preferredLocations", "Preferred Locations", FieldKind::Text)
                .required()
                .help("Districts or neighbourhoods, comma separated"),
            F::new("landSize", "Land Size (sq ft)", FieldKind::Number).rule(positive(MSG_SIZE)),
            F::new("builtUpSize", "Built-up Size (sq ft)", FieldKind::Number)
                .rule(positive(MSG_SIZE)),
            F::new("minBudget", "Minimum Budget", FieldKind::Number)
                .required()
                .rule(positive(MSG_BUDGET)),
            F::new("maxBudget", "Maximum Budget", FieldKind::Number)
                .required()
                .rule(positive(MSG_BUDGET))
                .rule(Rule::GreaterThan {
                    other: "minBudget".into(),
                    message: "Maximum budget must be greater than minimum budget.".into(),
                }),
            F::new("bedroomsNeeded", "Bedrooms Needed", FieldKind::Text),
            F::new("tenurePreference", "Tenure Preference", FieldKind::select(Vec::<String>::new())),
            F::new("resaleOrNew", "Resale or New", FieldKind::select(Vec::<String>::new())),
            F::new("purpose", "Purpose", FieldKind::select(Vec::<String>::new())).required(),
            F::new("timelineToMoveIn", "Timeline to Move In", FieldKind::Text),
            F::new("familySize", "Family Size", FieldKind::Number).rule(Rule::IntegerRange {
                min: 1,
                max: 20,
                message: "Family size must be between 1 and 20.".into(),
            }),
            F::new("helperRoomRequired", "Helper Room Required", FieldKind::select(["Yes", "No"])),
            F::new("mustHaveFeatures", "Must-have Features", FieldKind::Text),
            F::new("dontWantCriteria", "Don't Want Criteria", FieldKind::Text),
            F::new("absdLiability", "ABSD Liability", FieldKind::Text),
            F::new("needToSellCurrent", "Need to Sell Current Home", FieldKind::select(["Yes", "No"])),
            F::new("currentHomeSellingStatus", "Current Home Selling Status", FieldKind::Text),
            F::new("currentResidence", "Current Residence", FieldKind::Text),
            F::new("availableViewingSchedule", "Available Viewing Schedule", FieldKind::Text),
            F::new("scheduledZoomDate", "Scheduled Zoom Date", FieldKind::Date),
            F::new("remarks", "Remarks", FieldKind::Text),
            F::new("requiredAction", "Required Action", FieldKind::Text),
        ],
    )
    .conditional("purpose", "Own Stay", "timelineToMoveIn")
    .conditional("needToSellCurrent", "Yes", "currentHomeSellingStatus")
}

pub fn property_form() -> FormSchema {
    let agents = RepeatingGroup::new(
        "agents",
        "Agents",
        vec![
            F::new("name", "Agent Name", FieldKind::Text).required(),
            F::new("contact", "Contact Number", FieldKind::Text)
                .required()
                .rule(Rule::Phone {
                    message: "Please enter a valid phone number.".into(),
                })
                .help("e.g., +65 9123 4567"),
            F::new("agency", "Agency", FieldKind::Text)
                .required()
                .help("e.g., PropNex Realty"),
        ],
    );

    FormSchema::new(
        EntityKind::Property,
        "Add Property",
        vec![
            F::new("propertyGuruUrl", "PropertyGuru URL", FieldKind::Text)
                .required()
                .rule(Rule::UrlContaining {
                    fragment: "propertyguru.com.sg".into(),
                    message: "Please enter a valid PropertyGuru URL.".into(),
                }),
            F::new("fullAddress", "Full Address", FieldKind::Text).required(),
            F::new("district", "District", FieldKind::Text).required(),
            F::new("tenure", "Tenure", FieldKind::select(Vec::<String>::new())).required(),
            F::new("storeys", "Storeys", FieldKind::Text),
            F::new("condition", "Condition", FieldKind::Text),
            F::new("facing", "Facing", FieldKind::Text),
            F::new("landSize", "Land Size (sq ft)", FieldKind::Number).rule(positive(MSG_SIZE)),
            F::new("builtUp", "Built-up (sq ft)", FieldKind::Number).rule(positive(MSG_SIZE)),
            F::new("askingPrice", "Asking Price", FieldKind::Number)
                .required()
                .rule(positive("Please enter a valid asking price.")),
            F::new("bedrooms", "Bedrooms", FieldKind::Text),
            F::new("bathrooms", "Bathrooms", FieldKind::Text),
            F::new("helperRoom", "Helper Room", FieldKind::select(["Yes", "No"])),
            F::new("nearestMrt", "Nearest MRT", FieldKind::Text),
            F::new("mrtDistance", "MRT Distance (m)", FieldKind::Number)
                .rule(positive("Please enter a valid distance.")),
            F::new("nearbySchools", "Nearby Schools", FieldKind::Text),
            F::new("pros", "Pros", FieldKind::Text),
            F::new("cons", "Cons", FieldKind::Text),
            F::new("notes", "Notes", FieldKind::Text),
            F::new("status", "Status", FieldKind::select(Vec::<String>::new())).required(),
            F::new("soldDate", "Sold Date", FieldKind::Date),
        ],
    )
    .conditional("status", "Sold", "soldDate")
    .repeating(agents)
}

pub fn form_for(kind: EntityKind) -> FormSchema {
    match kind {
        EntityKind::Buyer => buyer_profile_form(),
        EntityKind::Property => property_form(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dependents_follow_their_triggers() {
        for schema in [buyer_profile_form(), property_form()] {
            for group in &schema.conditionals {
                let pos = |name: &str| schema.fields.iter().position(|f| f.name == name);
                let trigger = pos(&group.trigger).expect("trigger registered");
                let dependent = pos(&group.dependent).expect("dependent registered");
                assert!(trigger < dependent, "{} before {}", group.trigger, group.dependent);
                assert!(!schema.fields[dependent].required);
            }
        }
    }

    #[test]
    fn field_names_are_unique() {
        for schema in [buyer_profile_form(), property_form()] {
            let mut names: Vec<_> = schema.fields.iter().map(|f| f.name.as_str()).collect();
            names.sort_unstable();
            let len = names.len();
            names.dedup();
            assert_eq!(names.len(), len);
        }
    }

    #[test]
    fn only_property_has_agents() {
        assert!(buyer_profile_form().repeating.is_none());
        assert_eq!(property_form().repeating.map(|g| g.fields.len()), Some(3));
    }
}
