//! Prompt construction for the name-extraction call.

/// Builds the extraction prompt for one product title. `brewery_hint` comes
/// from the local brewery index when a known brewery name appears in the
/// title.
pub(crate) fn build_prompt(product_name: &str, brewery_hint: Option<&str>) -> String {
    let hint = brewery_hint
        .map(|b| format!("\nNote: the brewery is likely \"{b}\"."))
        .unwrap_or_default();

    format!(
        r#"Extract the brewery name and beer name from the following product title,
split into Japanese and English forms where present. Also decide whether the
product is a bundle (a variety pack of different beers, or merchandise such
as a glass) rather than a single beer. A multi-pack of the SAME beer is not
a bundle.

Product title: "{product_name}"{hint}

Guidelines:
- Common title formats are "Beer Name / Brewery Name" and "【Beer Name/Brewery Name】";
  in the bracketed form the first part is the beer, the second the brewery.
- Use your knowledge of craft breweries to normalize names you recognize.
- If several breweries appear (a collaboration), extract the FIRST one listed.
- Set "is_bundle" to true for sets of different beers ("飲み比べセット",
  "variety pack", "3種セット") and for non-beer items (glassware, apparel).

Return ONLY a raw JSON object, no markdown fences, with exactly these keys:
- "brewery_name_native" (Japanese brewery name, or null)
- "brewery_name_latin" (English brewery name, or null)
- "beer_name_native" (Japanese beer name, or null)
- "beer_name_latin" (English beer name, or null)
- "is_bundle" (boolean)

Examples:
1. "【TECHNO PILS/FETISH CLUB】" ->
   {{"brewery_name_native": null, "brewery_name_latin": "FETISH CLUB",
     "beer_name_native": null, "beer_name_latin": "TECHNO PILS", "is_bundle": false}}
2. "Theory of Clarity / Inkhorn Brewing" ->
   {{"brewery_name_native": "インクホーン", "brewery_name_latin": "Inkhorn Brewing",
     "beer_name_native": null, "beer_name_latin": "Theory of Clarity", "is_bundle": false}}
3. "おまかせ6本セット / Random 6 Bottle Set" ->
   {{"brewery_name_native": null, "brewery_name_latin": null,
     "beer_name_native": "おまかせ6本セット", "beer_name_latin": "Random 6 Bottle Set",
     "is_bundle": true}}
4. "ブラックタイド ブラックデーモン / BLACK TIDE Black Demon ≪12/20入荷予定≫" ->
   {{"brewery_name_native": "ブラックタイド", "brewery_name_latin": "BLACK TIDE BREWING",
     "beer_name_native": "ブラックデーモン", "beer_name_latin": "Black Demon",
     "is_bundle": false}}"#
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prompt_embeds_title_and_hint() {
        let prompt = build_prompt("West Coast IPA / Green Cheek", Some("Green Cheek Beer Co."));
        assert!(prompt.contains("\"West Coast IPA / Green Cheek\""));
        assert!(prompt.contains("likely \"Green Cheek Beer Co.\""));
    }

    #[test]
    fn prompt_without_hint_has_no_note_line() {
        let prompt = build_prompt("Hazy IPA", None);
        assert!(!prompt.contains("likely"));
    }
}
