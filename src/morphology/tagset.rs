//! Tag vocabulary.
//!
//! `category` holds the canonical feature categories grammar features are
//! grouped under; `syntagrus` holds the raw values a SynTagRus-style
//! disambiguator emits, plus the synthetic values added during
//! interpretation (`pos`, `fin`, `full`, `act` and the TIME values).

pub mod category {
    pub const POS: &str = "POS";
    pub const GENDER: &str = "GENDER";
    pub const NUMBER: &str = "NUMBER";
    pub const CASE: &str = "CASE";
    pub const ANIMACY: &str = "ANIMACY";
    pub const ADJ_GRAD: &str = "ADJ_GRAD";
    pub const ADJ_FORM: &str = "ADJ_FORM";
    pub const VERB_FORM: &str = "VERB_FORM";
    pub const MODE: &str = "MODE";
    pub const ASPECT: &str = "ASPECT";
    pub const TENSE: &str = "TENSE";
    pub const PERSON: &str = "PERS";
    pub const VOICE: &str = "VOICE";
    pub const TIME: &str = "TIME";
}

pub mod syntagrus {
    // parts of speech
    pub const POS_NOUN: &str = "S";
    pub const POS_VERB: &str = "V";
    pub const POS_ADJ: &str = "A";
    pub const POS_NUMR: &str = "NUM";
    pub const POS_ADVB: &str = "ADV";
    pub const POS_PREP: &str = "PR";
    pub const POS_CONJ: &str = "CONJ";
    pub const POS_PRCL: &str = "PART";
    pub const POS_INTJ: &str = "INTJ";
    pub const POS_UNKN: &str = "NID";
    pub const POS_SENT: &str = "P";

    pub const ANIM_Y: &str = "ОД";
    pub const ANIM_N: &str = "НЕОД";

    pub const G_MASC: &str = "МУЖ";
    pub const G_FEMN: &str = "ЖЕН";
    pub const G_NEUT: &str = "СРЕД";

    pub const N_SING: &str = "ЕД";
    pub const N_PLUR: &str = "МН";

    pub const C_NOM: &str = "ИМ";
    pub const C_DAT: &str = "ДАТ";
    pub const C_ACC: &str = "ВИН";
    pub const C_ABL: &str = "ТВОР";
    pub const C_GEN1: &str = "РОД";
    pub const C_GEN2: &str = "ПАРТ";
    pub const C_LOC1: &str = "ПР";
    pub const C_LOC2: &str = "МЕСТ";

    pub const DEG_COMP: &str = "СРАВ";
    pub const DEG_SUPERL: &str = "ПРЕВ";
    pub const DEG_POSITIVE: &str = "pos";

    pub const D_SHORT: &str = "КР";
    pub const D_FULL: &str = "full";

    pub const VT_GRND: &str = "ДЕЕПР";
    pub const VT_INF: &str = "ИНФ";
    pub const VT_PRT: &str = "ПРИЧ";
    pub const VT_FIN: &str = "fin";

    pub const M_INDC: &str = "ИЗЪЯВ";
    pub const M_IMPER: &str = "ПОВ";

    pub const A_PERF: &str = "СОВ";
    pub const A_IMPRF: &str = "НЕСОВ";

    pub const TN_NONPAST: &str = "НЕПРОШ";
    pub const TN_PAST: &str = "ПРОШ";
    pub const TN_PRES: &str = "НАСТ";

    pub const P_1: &str = "1-Л";
    pub const P_2: &str = "2-Л";
    pub const P_3: &str = "3-Л";

    pub const V_PASS: &str = "СТРАД";
    pub const V_ACT: &str = "act";

    pub const TIME_FUTURE: &str = "fut";
    pub const TIME_PAST: &str = "past";
    pub const TIME_PRESENT: &str = "pres";

    /// Forms of the future auxiliary; the tagger marks them non-past only.
    pub const FUTURE_AUXILIARY: &[&str] = &["БУДУ", "БУДЕМ", "БУДЕШЬ", "БУДЕТЕ", "БУДЕТ", "БУДУТ"];
}
