use crate::registry::{RegistryError, RegistryResult, Site, SiteRegistry};

/// Prefecture sites, grouped by region
///
/// (name, region, domain, department code). Registry order is the
/// deterministic crawl order.
const PREFECTURES: &[(&str, &str, &str, &str)] = &[
    // Auvergne-Rhône-Alpes
    ("Ain", "Auvergne-Rhône-Alpes", "ain.gouv.fr", "01"),
    ("Allier", "Auvergne-Rhône-Alpes", "allier.gouv.fr", "03"),
    ("Ardèche", "Auvergne-Rhône-Alpes", "ardeche.gouv.fr", "07"),
    ("Cantal", "Auvergne-Rhône-Alpes", "cantal.gouv.fr", "15"),
    ("Drôme", "Auvergne-Rhône-Alpes", "drome.gouv.fr", "26"),
    ("Isère", "Auvergne-Rhône-Alpes", "isere.gouv.fr", "38"),
    ("Loire", "Auvergne-Rhône-Alpes", "loire.gouv.fr", "42"),
    ("Haute-Loire", "Auvergne-Rhône-Alpes", "haute-loire.gouv.fr", "43"),
    ("Puy-de-Dôme", "Auvergne-Rhône-Alpes", "puy-de-dome.gouv.fr", "63"),
    ("Rhône", "Auvergne-Rhône-Alpes", "rhone.gouv.fr", "69"),
    ("Savoie", "Auvergne-Rhône-Alpes", "savoie.gouv.fr", "73"),
    ("Haute-Savoie", "Auvergne-Rhône-Alpes", "haute-savoie.gouv.fr", "74"),
    // Bourgogne-Franche-Comté
    ("Côte-d'Or", "Bourgogne-Franche-Comté", "cote-dor.gouv.fr", "21"),
    ("Doubs", "Bourgogne-Franche-Comté", "doubs.gouv.fr", "25"),
    ("Jura", "Bourgogne-Franche-Comté", "jura.gouv.fr", "39"),
    ("Nièvre", "Bourgogne-Franche-Comté", "nievre.gouv.fr", "58"),
    ("Saône-et-Loire", "Bourgogne-Franche-Comté", "saone-et-loire.gouv.fr", "71"),
    ("Yonne", "Bourgogne-Franche-Comté", "yonne.gouv.fr", "89"),
    ("Haute-Saône", "Bourgogne-Franche-Comté", "haute-saone.gouv.fr", "70"),
    ("Territoire-de-Belfort", "Bourgogne-Franche-Comté", "territoire-de-belfort.gouv.fr", "90"),
    // Bretagne
    ("Côtes d'Armor", "Bretagne", "cotes-darmor.gouv.fr", "22"),
    ("Finistère", "Bretagne", "finistere.gouv.fr", "29"),
    ("Ille-et-Vilaine", "Bretagne", "ille-et-vilaine.gouv.fr", "35"),
    ("Morbihan", "Bretagne", "morbihan.gouv.fr", "56"),
    // Centre-Val de Loire
    ("Cher", "Centre-Val de Loire", "cher.gouv.fr", "18"),
    ("Eure-et-Loir", "Centre-Val de Loire", "eure-et-loir.gouv.fr", "28"),
    ("Indre", "Centre-Val de Loire", "indre.gouv.fr", "36"),
    ("Indre-et-Loire", "Centre-Val de Loire", "indre-et-loire.gouv.fr", "37"),
    ("Loir-et-Cher", "Centre-Val de Loire", "loir-et-cher.gouv.fr", "41"),
    ("Loiret", "Centre-Val de Loire", "loiret.gouv.fr", "45"),
    // Grand Est
    ("Ardennes", "Grand Est", "ardennes.gouv.fr", "08"),
    ("Aube", "Grand Est", "aube.gouv.fr", "10"),
    ("Marne", "Grand Est", "marne.gouv.fr", "51"),
    ("Haute-Marne", "Grand Est", "haute-marne.gouv.fr", "52"),
    ("Meurthe-et-Moselle", "Grand Est", "meurthe-et-moselle.gouv.fr", "54"),
    ("Meuse", "Grand Est", "meuse.gouv.fr", "55"),
    ("Moselle", "Grand Est", "moselle.gouv.fr", "57"),
    ("Bas-Rhin", "Grand Est", "bas-rhin.gouv.fr", "67"),
    ("Haut-Rhin", "Grand Est", "haut-rhin.gouv.fr", "68"),
    ("Vosges", "Grand Est", "vosges.gouv.fr", "88"),
    // Hauts-de-France
    ("Aisne", "Hauts-de-France", "aisne.gouv.fr", "02"),
    ("Nord", "Hauts-de-France", "nord.gouv.fr", "59"),
    ("Oise", "Hauts-de-France", "oise.gouv.fr", "60"),
    ("Pas-de-Calais", "Hauts-de-France", "pas-de-calais.gouv.fr", "62"),
    ("Somme", "Hauts-de-France", "somme.gouv.fr", "80"),
    // Île-de-France
    ("Paris", "Île-de-France", "paris.gouv.fr", "75"),
    ("Seine-et-Marne", "Île-de-France", "seine-et-marne.gouv.fr", "77"),
    ("Yvelines", "Île-de-France", "yvelines.gouv.fr", "78"),
    ("Essonne", "Île-de-France", "essonne.gouv.fr", "91"),
    ("Hauts-de-Seine", "Île-de-France", "hauts-de-seine.gouv.fr", "92"),
    ("Seine-Saint-Denis", "Île-de-France", "seine-saint-denis.gouv.fr", "93"),
    ("Val-de-Marne", "Île-de-France", "val-de-marne.gouv.fr", "94"),
    ("Val-d'Oise", "Île-de-France", "val-doise.gouv.fr", "95"),
    // Normandie
    ("Calvados", "Normandie", "calvados.gouv.fr", "14"),
    ("Eure", "Normandie", "eure.gouv.fr", "27"),
    ("Manche", "Normandie", "manche.gouv.fr", "50"),
    ("Orne", "Normandie", "orne.gouv.fr", "61"),
    ("Seine-Maritime", "Normandie", "seine-maritime.gouv.fr", "76"),
    // Pays de la Loire
    ("Loire-Atlantique", "Pays de la Loire", "loire-atlantique.gouv.fr", "44"),
    ("Maine-et-Loire", "Pays de la Loire", "maine-et-loire.gouv.fr", "49"),
    ("Mayenne", "Pays de la Loire", "mayenne.gouv.fr", "53"),
    ("Sarthe", "Pays de la Loire", "sarthe.gouv.fr", "72"),
    ("Vendée", "Pays de la Loire", "vendee.gouv.fr", "85"),
];

/// Built-in registry over the prefecture table
///
/// The compiled-in table keeps deployments self-contained; an external
/// registry backed by a database can replace it behind the same trait.
#[derive(Debug, Clone)]
pub struct StaticRegistry {
    sites: Vec<Site>,
}

impl StaticRegistry {
    /// Creates a registry from the built-in prefecture table
    pub fn new() -> Self {
        let sites = PREFECTURES
            .iter()
            .map(|(name, region, domain, code)| Site {
                name: name.to_string(),
                region: region.to_string(),
                domain: domain.to_string(),
                code: code.to_string(),
            })
            .collect();
        Self { sites }
    }

    /// Creates a registry from an explicit site list (test and embedding use)
    pub fn from_sites(sites: Vec<Site>) -> Self {
        Self { sites }
    }

    /// Total number of sites in the registry
    pub fn len(&self) -> usize {
        self.sites.len()
    }

    /// Whether the registry is empty
    pub fn is_empty(&self) -> bool {
        self.sites.is_empty()
    }
}

impl Default for StaticRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl SiteRegistry for StaticRegistry {
    fn list_sites(
        &self,
        region_filter: Option<&str>,
        site_filter: Option<&str>,
    ) -> RegistryResult<Vec<Site>> {
        let mut sites: Vec<Site> = self.sites.clone();

        if let Some(region) = region_filter {
            sites.retain(|s| s.region.to_lowercase() == region.to_lowercase());
            if sites.is_empty() {
                return Err(RegistryError::UnknownRegion(region.to_string()));
            }
        }

        if let Some(name) = site_filter {
            sites.retain(|s| s.name.to_lowercase() == name.to_lowercase());
            if sites.is_empty() {
                return Err(RegistryError::UnknownSite(name.to_string()));
            }
        }

        Ok(sites)
    }

    fn list_regions(&self) -> RegistryResult<Vec<String>> {
        let mut regions = Vec::new();
        for site in &self.sites {
            if !regions.contains(&site.region) {
                regions.push(site.region.clone());
            }
        }
        Ok(regions)
    }
}
