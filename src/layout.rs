//! # Receipt Layout Module
//!
//! Process-wide constants for the two supported receipt layouts: the field
//! coordinate tables, the shared font size and the brand text color. These
//! are fixed at build time and never mutated.

/// Font size in pixels used for every rendered field.
pub const FONT_SIZE_PX: f32 = 42.0;

/// Brand text color: near-black with a faint violet tint.
pub const TEXT_COLOR: [u8; 3] = [20, 0, 35];

/// The two supported receipt templates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LayoutVariant {
    /// Plain transfer receipt: name, amount, phone, date, reference.
    Standard,
    /// Receipt carrying an additional alias key line.
    KeyedAlias,
}

impl LayoutVariant {
    pub fn label(self) -> &'static str {
        match self {
            LayoutVariant::Standard => "standard",
            LayoutVariant::KeyedAlias => "llave",
        }
    }
}

/// Pixel coordinates for each field of a layout variant.
#[derive(Debug, Clone, Copy)]
pub struct LayoutSpec {
    pub name: (i32, i32),
    pub amount: (i32, i32),
    pub phone: (i32, i32),
    pub date: (i32, i32),
    pub reference: (i32, i32),
    /// Present only for [`LayoutVariant::KeyedAlias`].
    pub alias_key: Option<(i32, i32)>,
}

const STANDARD_SPEC: LayoutSpec = LayoutSpec {
    name: (84, 1033),
    amount: (84, 1174),
    phone: (84, 1320),
    date: (84, 1460),
    reference: (84, 1613),
    alias_key: None,
};

const KEYED_ALIAS_SPEC: LayoutSpec = LayoutSpec {
    name: (84, 1008),
    alias_key: Some((84, 1148)),
    amount: (84, 1292),
    phone: (84, 1436),
    date: (84, 1580),
    reference: (84, 1724),
};

/// Coordinate table for a layout variant.
pub fn layout_spec(variant: LayoutVariant) -> &'static LayoutSpec {
    match variant {
        LayoutVariant::Standard => &STANDARD_SPEC,
        LayoutVariant::KeyedAlias => &KEYED_ALIAS_SPEC,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_standard_spec_has_no_alias_coordinate() {
        assert!(layout_spec(LayoutVariant::Standard).alias_key.is_none());
    }

    #[test]
    fn test_keyed_alias_spec_has_alias_coordinate() {
        assert!(layout_spec(LayoutVariant::KeyedAlias).alias_key.is_some());
    }

    #[test]
    fn test_fields_share_left_margin() {
        for variant in [LayoutVariant::Standard, LayoutVariant::KeyedAlias] {
            let spec = layout_spec(variant);
            assert_eq!(spec.name.0, 84);
            assert_eq!(spec.amount.0, 84);
            assert_eq!(spec.phone.0, 84);
            assert_eq!(spec.date.0, 84);
            assert_eq!(spec.reference.0, 84);
        }
    }

    #[test]
    fn test_variant_labels() {
        assert_eq!(LayoutVariant::Standard.label(), "standard");
        assert_eq!(LayoutVariant::KeyedAlias.label(), "llave");
    }
}
