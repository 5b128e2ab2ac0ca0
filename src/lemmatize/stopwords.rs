//! Minimal functional stop word lists.
use std::collections::HashSet;

use lazy_static::lazy_static;

use crate::lang::Lang;

lazy_static! {
    static ref RU: HashSet<&'static str> = [
        "и", "в", "не", "на", "что", "с", "по", "как", "это", "к", "из", "но", "за", "то", "до",
        "же", "от", "а", "или", "об", "для", "при", "так", "быть", "он", "она", "они", "мы",
        "вы", "его", "её", "их", "наш", "ваш", "этот", "тот", "все", "уже", "ещё", "даже",
        "только", "если", "когда", "чтобы",
    ]
    .into_iter()
    .collect();
    static ref EL: HashSet<&'static str> = [
        "και", "το", "τα", "τη", "τον", "την", "τους", "τις", "της", "με", "για", "από", "στο",
        "στη", "στον", "στην", "στα", "που", "να", "θα", "αλλά", "ή", "αν", "ως", "ότι", "είναι",
        "δεν", "μας", "σας", "αυτό", "αυτή", "αυτός", "κι",
    ]
    .into_iter()
    .collect();
    static ref EN: HashSet<&'static str> = [
        "the", "and", "for", "are", "but", "not", "you", "all", "any", "can", "her", "was",
        "one", "our", "out", "his", "has", "have", "had", "its", "who", "this", "that", "with",
        "from", "they", "will", "would", "there", "their", "what", "about", "which", "when",
        "been", "were", "into", "than", "then", "them", "these", "those", "also", "such",
        "some", "more", "most", "other", "over", "only", "very", "just", "should", "could",
    ]
    .into_iter()
    .collect();
    static ref NONE: HashSet<&'static str> = HashSet::new();
}

/// Stop words for `lang`. [Lang::Unknown] has none.
pub fn stopwords(lang: Lang) -> &'static HashSet<&'static str> {
    match lang {
        Lang::Ru => &RU,
        Lang::El => &EL,
        Lang::En => &EN,
        Lang::Unknown => &NONE,
    }
}
