//! Well-known namespaces and the built-in datatype catalogue.

/// Namespace of the schema language itself
pub const XS_NS: &str = "http://www.w3.org/2001/XMLSchema";

/// Namespace bound to the reserved `xml` prefix
pub const XML_NS: &str = "http://www.w3.org/XML/1998/namespace";

pub const XML_PREFIX: &str = "xml";

/// Conventional prefix for [`XS_NS`] in emitted documents
pub const XS_PREFIX: &str = "xs";

/// Locator under which the built-in catalogue is registered.
pub const BUILTIN_LOCATOR: &str = "builtin:XMLSchema";

pub const ANY_TYPE: &str = "anyType";
pub const ANY_SIMPLE_TYPE: &str = "anySimpleType";

/// Built-in simple datatypes and the local name of their base type.
///
/// List types (`NMTOKENS`, `IDREFS`, `ENTITIES`) derive from `anySimpleType`.
pub const BUILTIN_SIMPLE_TYPES: &[(&str, &str)] = &[
    (ANY_SIMPLE_TYPE, ANY_TYPE),
    // primitives
    ("string", ANY_SIMPLE_TYPE),
    ("boolean", ANY_SIMPLE_TYPE),
    ("decimal", ANY_SIMPLE_TYPE),
    ("float", ANY_SIMPLE_TYPE),
    ("double", ANY_SIMPLE_TYPE),
    ("duration", ANY_SIMPLE_TYPE),
    ("dateTime", ANY_SIMPLE_TYPE),
    ("time", ANY_SIMPLE_TYPE),
    ("date", ANY_SIMPLE_TYPE),
    ("gYearMonth", ANY_SIMPLE_TYPE),
    ("gYear", ANY_SIMPLE_TYPE),
    ("gMonthDay", ANY_SIMPLE_TYPE),
    ("gDay", ANY_SIMPLE_TYPE),
    ("gMonth", ANY_SIMPLE_TYPE),
    ("hexBinary", ANY_SIMPLE_TYPE),
    ("base64Binary", ANY_SIMPLE_TYPE),
    ("anyURI", ANY_SIMPLE_TYPE),
    ("QName", ANY_SIMPLE_TYPE),
    ("NOTATION", ANY_SIMPLE_TYPE),
    // derived from string
    ("normalizedString", "string"),
    ("token", "normalizedString"),
    ("language", "token"),
    ("NMTOKEN", "token"),
    ("NMTOKENS", ANY_SIMPLE_TYPE),
    ("Name", "token"),
    ("NCName", "Name"),
    ("ID", "NCName"),
    ("IDREF", "NCName"),
    ("IDREFS", ANY_SIMPLE_TYPE),
    ("ENTITY", "NCName"),
    ("ENTITIES", ANY_SIMPLE_TYPE),
    // derived from decimal
    ("integer", "decimal"),
    ("nonPositiveInteger", "integer"),
    ("negativeInteger", "nonPositiveInteger"),
    ("long", "integer"),
    ("int", "long"),
    ("short", "int"),
    ("byte", "short"),
    ("nonNegativeInteger", "integer"),
    ("unsignedLong", "nonNegativeInteger"),
    ("unsignedInt", "unsignedLong"),
    ("unsignedShort", "unsignedInt"),
    ("unsignedByte", "unsignedShort"),
    ("positiveInteger", "nonNegativeInteger"),
];
