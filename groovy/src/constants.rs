// https://groovy-lang.org/differences.html
pub const GROOVY_IMPLICIT_IMPORTS: [&str; 7] = [
    "java.io.*",
    "java.lang.*",
    "java.math.BigDecimal",
    "java.math.BigInteger",
    "java.net.*",
    "java.util.*",
    "groovy.*",
];
