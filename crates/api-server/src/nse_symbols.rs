//! Static NSE reference list backing ticker suggestions.

/// NSE listed equities offered as ticker suggestions: (symbol, company name).
pub const NSE_SYMBOLS: &[(&str, &str)] = &[
    ("RELIANCE", "Reliance Industries Limited"),
    ("TCS", "Tata Consultancy Services Limited"),
    ("HDFCBANK", "HDFC Bank Limited"),
    ("INFY", "Infosys Limited"),
    ("HINDUNILVR", "Hindustan Unilever Limited"),
    ("ICICIBANK", "ICICI Bank Limited"),
    ("KOTAKBANK", "Kotak Mahindra Bank Limited"),
    ("BHARTIARTL", "Bharti Airtel Limited"),
    ("ITC", "ITC Limited"),
    ("SBIN", "State Bank of India"),
    ("BAJFINANCE", "Bajaj Finance Limited"),
    ("LT", "Larsen & Toubro Limited"),
    ("HCLTECH", "HCL Technologies Limited"),
    ("ASIANPAINT", "Asian Paints Limited"),
    ("AXISBANK", "Axis Bank Limited"),
    ("MARUTI", "Maruti Suzuki India Limited"),
    ("SUNPHARMA", "Sun Pharmaceutical Industries Limited"),
    ("TITAN", "Titan Company Limited"),
    ("WIPRO", "Wipro Limited"),
    ("ULTRACEMCO", "UltraTech Cement Limited"),
    ("NESTLEIND", "Nestle India Limited"),
    ("BAJAJFINSV", "Bajaj Finserv Limited"),
    ("TECHM", "Tech Mahindra Limited"),
    ("ADANIPORTS", "Adani Ports and Special Economic Zone Limited"),
    ("ONGC", "Oil and Natural Gas Corporation Limited"),
    ("NTPC", "NTPC Limited"),
    ("TATAMOTORS", "Tata Motors Limited"),
    ("POWERGRID", "Power Grid Corporation of India Limited"),
    ("COALINDIA", "Coal India Limited"),
    ("JSWSTEEL", "JSW Steel Limited"),
    ("GRASIM", "Grasim Industries Limited"),
    ("DIVISLAB", "Divi's Laboratories Limited"),
    ("TATASTEEL", "Tata Steel Limited"),
    ("BRITANNIA", "Britannia Industries Limited"),
    ("DRREDDY", "Dr. Reddy's Laboratories Limited"),
    ("ADANIGREEN", "Adani Green Energy Limited"),
    ("BAJAJ-AUTO", "Bajaj Auto Limited"),
    ("EICHERMOT", "Eicher Motors Limited"),
    ("APOLLOHOSP", "Apollo Hospitals Enterprise Limited"),
    ("HEROMOTOCO", "Hero MotoCorp Limited"),
    ("CIPLA", "Cipla Limited"),
    ("INDUSINDBK", "IndusInd Bank Limited"),
    ("TATACONSUM", "Tata Consumer Products Limited"),
    ("SHREECEM", "Shree Cement Limited"),
    ("HINDALCO", "Hindalco Industries Limited"),
    ("BPCL", "Bharat Petroleum Corporation Limited"),
    ("GODREJCP", "Godrej Consumer Products Limited"),
    ("ADANITRANS", "Adani Transmission Limited"),
    ("HDFCLIFE", "HDFC Life Insurance Company Limited"),
    ("SBILIFE", "SBI Life Insurance Company Limited"),
    ("PNB", "Punjab National Bank"),
    ("BANKBARODA", "Bank of Baroda"),
    ("CANBK", "Canara Bank"),
    ("UNIONBANK", "Union Bank of India"),
    ("IDFCFIRSTB", "IDFC First Bank Limited"),
    ("FEDERALBNK", "Federal Bank Limited"),
    ("RBLBANK", "RBL Bank Limited"),
    ("BANDHANBNK", "Bandhan Bank Limited"),
    ("AUBANK", "AU Small Finance Bank Limited"),
    ("MINDTREE", "Mindtree Limited"),
    ("MPHASIS", "Mphasis Limited"),
    ("LTI", "L&T Infotech Limited"),
    ("LTTS", "L&T Technology Services Limited"),
    ("COFORGE", "Coforge Limited"),
    ("PERSISTENT", "Persistent Systems Limited"),
    ("CYIENT", "Cyient Limited"),
    ("INTELLECT", "Intellect Design Arena Limited"),
    ("LUPIN", "Lupin Limited"),
    ("BIOCON", "Biocon Limited"),
    ("AUROBINDO", "Aurobindo Pharma Limited"),
    ("CADILAHC", "Cadila Healthcare Limited"),
    ("GLENMARK", "Glenmark Pharmaceuticals Limited"),
    ("TORNTPHARM", "Torrent Pharmaceuticals Limited"),
    ("ALKEM", "Alkem Laboratories Limited"),
    ("ABBOTINDIA", "Abbott India Limited"),
    ("M&M", "Mahindra & Mahindra Limited"),
    ("ASHOKLEY", "Ashok Leyland Limited"),
    ("TVSMOTORS", "TVS Motor Company Limited"),
    ("ESCORTS", "Escorts Limited"),
    ("MOTHERSUMI", "Motherson Sumi Systems Limited"),
    ("BOSCHLTD", "Bosch Limited"),
    ("MRF", "MRF Limited"),
    ("DABUR", "Dabur India Limited"),
    ("MARICO", "Marico Limited"),
    ("COLPAL", "Colgate Palmolive (India) Limited"),
    ("PIDILITIND", "Pidilite Industries Limited"),
    ("VBL", "Varun Beverages Limited"),
    ("EMAMILTD", "Emami Limited"),
    ("KRBL", "KRBL Limited"),
    ("VEDL", "Vedanta Limited"),
    ("NMDC", "NMDC Limited"),
    ("HINDZINC", "Hindustan Zinc Limited"),
    ("NATIONALUM", "National Aluminium Company Limited"),
    ("SAIL", "Steel Authority of India Limited"),
    ("JINDALSTEL", "Jindal Steel & Power Limited"),
    ("RATNAMANI", "Ratnamani Metals & Tubes Limited"),
    ("IOC", "Indian Oil Corporation Limited"),
    ("GAIL", "GAIL (India) Limited"),
    ("PETRONET", "Petronet LNG Limited"),
    ("TORNTPOWER", "Torrent Power Limited"),
    ("TATAPOWER", "Tata Power Company Limited"),
    ("NHPC", "NHPC Limited"),
    ("SJVN", "SJVN Limited"),
    ("IDEA", "Vodafone Idea Limited"),
    ("RCOM", "Reliance Communications Limited"),
    ("DLF", "DLF Limited"),
    ("GODREJPROP", "Godrej Properties Limited"),
    ("SOBHA", "Sobha Limited"),
    ("BRIGADE", "Brigade Enterprises Limited"),
    ("PRESTIGE", "Prestige Estates Projects Limited"),
    ("DMART", "Avenue Supermarts Limited"),
    ("TRENT", "Trent Limited"),
    ("ADITYADHUL", "Aditya Birla Fashion and Retail Limited"),
    ("JUBLFOOD", "Jubilant FoodWorks Limited"),
    ("WESTLIFE", "Westlife Development Limited"),
    ("ZEEL", "Zee Entertainment Enterprises Limited"),
    ("SUNTV", "Sun TV Network Limited"),
    ("BALRAMCHIN", "Balrampur Chini Mills Limited"),
    ("NETWORK18", "Network18 Media & Investments Limited"),
    ("WELCORP", "Welspun Corp Limited"),
    ("TRIDENT", "Trident Limited"),
    ("RAYMOND", "Raymond Limited"),
    ("ARVIND", "Arvind Limited"),
    ("UPL", "UPL Limited"),
    ("AARTI", "Aarti Industries Limited"),
    ("GNFC", "Gujarat Narmada Valley Fertilizers & Chemicals Limited"),
    ("ALKYLAMINE", "Alkyl Amines Chemicals Limited"),
    ("CLEAN", "Clean Science and Technology Limited"),
    ("ACC", "ACC Limited"),
    ("AMBUJACMNT", "Ambuja Cements Limited"),
    ("HEIDELBERG", "HeidelbergCement India Limited"),
    ("JKCEMENT", "JK Cement Limited"),
    ("RAMCOCEM", "The Ramco Cements Limited"),
    ("ADANIGAS", "Adani Total Gas Limited"),
    ("ADANIPOWER", "Adani Power Limited"),
    ("ADANIENSOL", "Adani Energy Solutions Limited"),
    ("ZOMATO", "Zomato Limited"),
    ("NYKAA", "FSN E-Commerce Ventures Limited"),
    ("PAYTM", "One 97 Communications Limited"),
    ("POLICYBZR", "PB Fintech Limited"),
    ("IRCTC", "Indian Railway Catering and Tourism Corporation Limited"),
    ("LICI", "Life Insurance Corporation of India"),
    ("DELTACORP", "Delta Corp Limited"),
    ("PVR", "PVR Limited"),
    ("INOXLEISUR", "INOX Leisure Limited"),
    ("CCL", "CCL Products (India) Limited"),
    ("COFFEEDAY", "Coffee Day Enterprises Limited"),
    ("SPICEJET", "SpiceJet Limited"),
    ("INDIGO", "InterGlobe Aviation Limited"),
    ("IRFC", "Indian Railway Finance Corporation Limited"),
    ("HAL", "Hindustan Aeronautics Limited"),
    ("BEL", "Bharat Electronics Limited"),
    ("BHEL", "Bharat Heavy Electricals Limited"),
    ("RITES", "RITES Limited"),
    ("CONCOR", "Container Corporation of India Limited"),
    ("INDIANB", "Indian Bank"),
    ("CENTRALBK", "Central Bank of India"),
    ("MAHABANK", "Bank of Maharashtra"),
    ("IOB", "Indian Overseas Bank"),
    ("CHOLAFIN", "Cholamandalam Investment and Finance Company Limited"),
    ("MUTHOOTFIN", "Muthoot Finance Limited"),
    ("MANAPPURAM", "Manappuram Finance Limited"),
    ("STAR", "Strides Pharma Science Limited"),
    ("REDDY", "Dr. Reddy's Laboratories Limited"),
    ("APOLLOTYRE", "Apollo Tyres Limited"),
    ("CEAT", "CEAT Limited"),
    ("BALKRISIND", "Balkrishna Industries Limited"),
    ("ICICIPRULI", "ICICI Prudential Life Insurance Company Limited"),
    ("MAXLIFE", "Max Life Insurance Company Limited"),
    ("STARHEALTH", "Star Health and Allied Insurance Company Limited"),
];

pub const DEFAULT_LIMIT: usize = 8;
pub const MAX_LIMIT: usize = 50;

pub fn lookup(symbol: &str) -> Option<&'static (&'static str, &'static str)> {
    let symbol = symbol.trim().to_uppercase();
    NSE_SYMBOLS.iter().find(|(s, _)| *s == symbol)
}

/// Ranked suggestions: exact symbol, symbol prefix, symbol substring, then
/// company-name substring. Each symbol appears once.
pub fn search(query: &str, limit: usize) -> Vec<&'static (&'static str, &'static str)> {
    let term = query.trim().to_uppercase();
    if term.is_empty() || limit == 0 {
        return Vec::new();
    }

    let rank = |(symbol, name): &(&str, &str)| -> Option<u8> {
        if *symbol == term {
            Some(0)
        } else if symbol.starts_with(&term) {
            Some(1)
        } else if symbol.contains(&term) {
            Some(2)
        } else if name.to_uppercase().contains(&term) {
            Some(3)
        } else {
            None
        }
    };

    let mut ranked: Vec<(u8, usize, &'static (&'static str, &'static str))> = NSE_SYMBOLS
        .iter()
        .enumerate()
        .filter_map(|(i, entry)| rank(entry).map(|r| (r, i, entry)))
        .collect();
    // Stable within a tier: list order
    ranked.sort_by_key(|(r, i, _)| (*r, *i));

    let mut seen = std::collections::HashSet::new();
    ranked
        .into_iter()
        .map(|(_, _, entry)| entry)
        .filter(|(symbol, _)| seen.insert(*symbol))
        .take(limit)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn symbols(query: &str, limit: usize) -> Vec<&'static str> {
        search(query, limit).into_iter().map(|(s, _)| *s).collect()
    }

    #[test]
    fn test_exact_match_first() {
        let results = symbols("tcs", DEFAULT_LIMIT);
        assert_eq!(results[0], "TCS");
    }

    #[test]
    fn test_tier_order() {
        let results = search("BANK", MAX_LIMIT);
        let first_name_only = results
            .iter()
            .position(|(s, _)| !s.contains("BANK"))
            .unwrap_or(results.len());
        // Every symbol hit precedes every name-only hit
        assert!(results[first_name_only..]
            .iter()
            .all(|(s, _)| !s.contains("BANK")));
        assert!(results[..first_name_only]
            .iter()
            .all(|(s, _)| s.contains("BANK")));
        assert!(first_name_only > 0);
    }

    #[test]
    fn test_name_match() {
        let results = symbols("reliance", DEFAULT_LIMIT);
        assert!(results.contains(&"RELIANCE"));

        let results = symbols("consultancy", DEFAULT_LIMIT);
        assert_eq!(results, vec!["TCS"]);
    }

    #[test]
    fn test_limit_and_empty_query() {
        assert!(search("a", 3).len() <= 3);
        assert!(search("   ", DEFAULT_LIMIT).is_empty());
        assert!(search("ZZZZNOTASTOCK", DEFAULT_LIMIT).is_empty());
    }

    #[test]
    fn test_lookup() {
        assert_eq!(lookup("infy").map(|(_, n)| *n), Some("Infosys Limited"));
        assert!(lookup("NOPE").is_none());
    }

    #[test]
    fn test_list_has_unique_symbols() {
        let mut seen = std::collections::HashSet::new();
        assert!(NSE_SYMBOLS.iter().all(|(s, _)| seen.insert(*s)));
    }
}
